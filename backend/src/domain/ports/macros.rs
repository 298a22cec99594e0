//! Helper macro for generating domain port error enums.
//!
//! Port adapters surface infrastructure failures as small message-carrying
//! enums; the macro keeps the thiserror derive and the snake_case
//! constructors uniform across ports.

macro_rules! define_port_error {
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant {
                    /// Adapter-provided failure description.
                    message: String,
                },
            )*
        }

        impl $name {
            ::paste::paste! {
                $(
                    #[doc = concat!("Build the `", stringify!($variant), "` variant.")]
                    pub fn [<$variant:snake>](message: impl Into<String>) -> Self {
                        Self::$variant { message: message.into() }
                    }
                )*
            }
        }
    };
}

pub(crate) use define_port_error;
