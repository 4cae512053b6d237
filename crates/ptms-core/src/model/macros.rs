/// Declarative macro for string-valued enums with lenient reads.
///
/// Generates, from one table of `Variant => "wire"` pairs:
///
/// - the enum, defaulting to the fallback variant
/// - `ALL` in definition order, `as_str`, and strict `parse`
/// - `Display` and strict `FromStr` (for CLI input)
/// - `Serialize` as the wire string
/// - `Deserialize` that folds unknown strings into the fallback variant
///   with a warning, so a single odd record never poisons a collection
macro_rules! lossy_string_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident (fallback = $fallback:ident) {
            $(
                $(#[doc = $doc:literal])*
                $variant:ident => $wire:literal
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum $name {
            $(
                $(#[doc = $doc])*
                $variant,
            )*
        }

        impl $name {
            /// All variants in definition order.
            pub const ALL: &'static [Self] = &[$(Self::$variant,)*];

            /// Canonical wire string.
            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)*
                }
            }

            /// Strict parse of a wire string.
            #[must_use]
            pub fn parse(raw: &str) -> Option<Self> {
                match raw {
                    $($wire => Some(Self::$variant),)*
                    _ => None,
                }
            }

            /// Parse, folding unknown values into the fallback variant.
            #[must_use]
            pub fn from_str_lossy(raw: &str) -> Self {
                Self::parse(raw).unwrap_or_else(|| {
                    tracing::warn!(
                        kind = stringify!($name),
                        value = raw,
                        fallback = Self::$fallback.as_str(),
                        "unrecognized value, using fallback"
                    );
                    Self::$fallback
                })
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::$fallback
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s).ok_or_else(|| {
                    let allowed: Vec<&str> = Self::ALL.iter().map(|v| v.as_str()).collect();
                    format!("unknown {} '{s}' (expected one of: {})", stringify!($name), allowed.join(", "))
                })
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = <String as serde::Deserialize>::deserialize(deserializer)?;
                Ok(Self::from_str_lossy(&raw))
            }
        }
    };
}
