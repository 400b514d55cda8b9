//! Macros for ergonomic state declaration.

/// Declare a state enum and its `State` implementation.
///
/// The state name is the variant name.
///
/// # Example
///
/// ```
/// use waypoint::state_enum;
/// use waypoint::core::State;
///
/// state_enum! {
///     pub enum Light {
///         Green,
///         Yellow,
///         Red,
///     }
/// }
///
/// assert_eq!(Light::Yellow.name(), "Yellow");
/// ```
#[macro_export]
macro_rules! state_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),*
        }

        impl $crate::core::State for $name {
            fn name(&self) -> &str {
                match self {
                    $(Self::$variant => stringify!($variant)),*
                }
            }
        }
    };
}
