use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, FixedSize, Read, ReadExt, Write};
use commonware_cryptography::ed25519::PublicKey;
use commonware_utils::hex;

/// Opaque reference to a confidential value.
///
/// A handle never carries the plaintext; the value behind it can only be observed through a
/// proof-gated reveal.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle([u8; 32]);

impl Handle {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl AsRef<[u8]> for Handle {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Handle({})", hex(&self.0))
    }
}

impl std::fmt::Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&hex(&self.0))
    }
}

impl Write for Handle {
    fn write(&self, writer: &mut impl BufMut) {
        self.0.write(writer);
    }
}

impl Read for Handle {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self(<[u8; 32]>::read(reader)?))
    }
}

impl FixedSize for Handle {
    const SIZE: usize = 32;
}

/// Party that may be granted decryption access to a handle.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Principal {
    /// The lottery itself.
    Contract,
    Account(PublicKey),
}

impl Write for Principal {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Contract => 0u8.write(writer),
            Self::Account(public) => {
                1u8.write(writer);
                public.write(writer);
            }
        }
    }
}

impl Read for Principal {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        match u8::read(reader)? {
            0 => Ok(Self::Contract),
            1 => Ok(Self::Account(PublicKey::read(reader)?)),
            i => Err(Error::InvalidEnum(i)),
        }
    }
}

impl EncodeSize for Principal {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::Contract => 0,
                Self::Account(_) => PublicKey::SIZE,
            }
    }
}
