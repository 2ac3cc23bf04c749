use anyhow::Result;
use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, Read, ReadExt, Write};
use commonware_cryptography::ed25519::PublicKey;
use sealdraw_types::{
    execution::{Account, Key, Value},
    lottery::{Contribution, Guess, LotteryState, Round},
};
use std::future::Future;

#[cfg(any(test, feature = "mocks"))]
use std::collections::HashMap;

#[derive(Debug)]
pub enum PrepareError {
    NonceMismatch { expected: u64, got: u64 },
    State(anyhow::Error),
}

/// Keyed store the lottery reads and writes through.
pub trait State {
    fn get(&self, key: &Key) -> impl Future<Output = Result<Option<Value>>>;
    fn insert(&mut self, key: Key, value: Value) -> impl Future<Output = Result<()>>;
    fn delete(&mut self, key: &Key) -> impl Future<Output = Result<()>>;

    fn apply(&mut self, changes: Vec<(Key, Status)>) -> impl Future<Output = Result<()>> {
        async {
            for (key, status) in changes {
                match status {
                    Status::Update(value) => self.insert(key, value).await?,
                    Status::Delete => self.delete(&key).await?,
                }
            }
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "mocks"))]
#[derive(Default)]
pub struct Memory {
    state: HashMap<Key, Value>,
}

#[cfg(any(test, feature = "mocks"))]
impl State for Memory {
    async fn get(&self, key: &Key) -> Result<Option<Value>> {
        Ok(self.state.get(key).cloned())
    }

    async fn insert(&mut self, key: Key, value: Value) -> Result<()> {
        self.state.insert(key, value);
        Ok(())
    }

    async fn delete(&mut self, key: &Key) -> Result<()> {
        self.state.remove(key);
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[allow(clippy::large_enum_variant)]
pub enum Status {
    Update(Value),
    Delete,
}

impl Write for Status {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Status::Update(value) => {
                0u8.write(writer);
                value.write(writer);
            }
            Status::Delete => 1u8.write(writer),
        }
    }
}

impl Read for Status {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let kind = u8::read(reader)?;
        match kind {
            0 => Ok(Status::Update(Value::read(reader)?)),
            1 => Ok(Status::Delete),
            _ => Err(Error::InvalidEnum(kind)),
        }
    }
}

impl EncodeSize for Status {
    fn encode_size(&self) -> usize {
        1 + match self {
            Status::Update(value) => value.encode_size(),
            Status::Delete => 0,
        }
    }
}

pub async fn nonce<S: State>(state: &S, public: &PublicKey) -> Result<u64> {
    Ok(load_account(state, public).await?.nonce)
}

pub(crate) async fn load_account<S: State>(state: &S, public: &PublicKey) -> Result<Account> {
    Ok(match state.get(&Key::Account(public.clone())).await? {
        Some(Value::Account(account)) => account,
        _ => Account::default(),
    })
}

pub(crate) fn validate_and_increment_nonce(
    account: &mut Account,
    provided_nonce: u64,
) -> Result<(), PrepareError> {
    if account.nonce != provided_nonce {
        return Err(PrepareError::NonceMismatch {
            expected: account.nonce,
            got: provided_nonce,
        });
    }
    account.nonce += 1;
    Ok(())
}

// Typed readers. A key holding a value of the wrong kind reads as absent.

pub async fn load_lottery<S: State>(state: &S) -> Result<Option<LotteryState>> {
    Ok(match state.get(&Key::Lottery).await? {
        Some(Value::Lottery(lottery)) => Some(lottery),
        _ => None,
    })
}

pub async fn load_round<S: State>(state: &S, id: u64) -> Result<Option<Round>> {
    Ok(match state.get(&Key::Round(id)).await? {
        Some(Value::Round(round)) => Some(round),
        _ => None,
    })
}

pub async fn load_guess<S: State>(state: &S, round: u64, index: u32) -> Result<Option<Guess>> {
    Ok(match state.get(&Key::Guess { round, index }).await? {
        Some(Value::Guess(guess)) => Some(guess),
        _ => None,
    })
}

pub async fn load_contribution<S: State>(
    state: &S,
    round: u64,
    bettor: &PublicKey,
) -> Result<Contribution> {
    let key = Key::Contribution {
        round,
        bettor: bettor.clone(),
    };
    Ok(match state.get(&key).await? {
        Some(Value::Contribution(contribution)) => contribution,
        _ => Contribution::default(),
    })
}

/// Funds committed to the unsettled round, if any.
///
/// A new round only opens once its predecessor is settled (or skipped), so the current round is
/// the only one that can still hold locked funds.
pub async fn locked_funds<S: State>(state: &S, current_round: u64) -> Result<u64> {
    Ok(match load_round(state, current_round).await? {
        Some(round) if !round.settled => round.total_pool,
        _ => 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use commonware_codec::{DecodeExt, Encode};
    use commonware_cryptography::{ed25519::PrivateKey, Signer};
    use commonware_runtime::{deterministic::Runner, Runner as _};
    use sealdraw_types::lottery::Handle;

    #[test]
    fn test_memory_apply_updates_and_deletes() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let mut state = Memory::default();
            let public = PrivateKey::from_seed(1).public_key();
            state
                .insert(Key::Account(public.clone()), Value::Account(Account { nonce: 3 }))
                .await
                .unwrap();

            state
                .apply(vec![
                    (Key::Account(public.clone()), Status::Delete),
                    (
                        Key::Contribution {
                            round: 1,
                            bettor: public.clone(),
                        },
                        Status::Update(Value::Contribution(Contribution {
                            amount: 5,
                            ..Contribution::default()
                        })),
                    ),
                ])
                .await
                .unwrap();

            assert_eq!(nonce(&state, &public).await.unwrap(), 0);
            assert_eq!(
                load_contribution(&state, 1, &public).await.unwrap().amount,
                5
            );
            assert!(state
                .get(&Key::Account(public.clone()))
                .await
                .unwrap()
                .is_none());
        });
    }

    #[test]
    fn test_locked_funds_tracks_current_round() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let mut state = Memory::default();
            assert_eq!(locked_funds(&state, 0).await.unwrap(), 0);

            let mut settled = Round::new(1, 0, Handle::default());
            settled.total_pool = 7;
            settled.settled = true;
            let mut open = Round::new(2, 10, Handle::default());
            open.total_pool = 3;
            state
                .insert(Key::Round(1), Value::Round(settled))
                .await
                .unwrap();
            state.insert(Key::Round(2), Value::Round(open.clone())).await.unwrap();
            assert_eq!(locked_funds(&state, 2).await.unwrap(), 3);

            open.settled = true;
            state.insert(Key::Round(2), Value::Round(open)).await.unwrap();
            assert_eq!(locked_funds(&state, 2).await.unwrap(), 0);
        });
    }

    #[test]
    fn test_nonce_must_match_exactly() {
        let mut account = Account { nonce: 2 };
        assert!(matches!(
            validate_and_increment_nonce(&mut account, 1),
            Err(PrepareError::NonceMismatch {
                expected: 2,
                got: 1
            })
        ));
        assert_eq!(account.nonce, 2);
        validate_and_increment_nonce(&mut account, 2).unwrap();
        assert_eq!(account.nonce, 3);
    }

    #[test]
    fn test_status_encoding() {
        let status = Status::Update(Value::Account(Account { nonce: 9 }));
        assert_eq!(Status::decode(status.encode()).unwrap(), status);
        assert_eq!(Status::Delete.encode().as_ref(), &[1u8]);
    }
}
