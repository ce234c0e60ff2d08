//! Entity type contract and the `entity!` declaration macro.

use crate::model::naming;

/// Static description of one table-backed entity type.
///
/// Implementations are normally generated by [`crate::entity!`]; the marker
/// type itself carries no data; rows live in [`crate::Record`].
pub trait Entity {
    /// Concrete type name, e.g. `"User"`.
    const NAME: &'static str;
    /// Declared attribute names, unqualified (`"name"`, not `"user_name"`).
    const COLUMNS: &'static [&'static str];

    /// Table name derived from [`Entity::NAME`].
    fn table_name() -> String {
        naming::table_name(Self::NAME)
    }

    /// Whether `attribute` is a declared column of this entity.
    fn has_column(attribute: &str) -> bool {
        Self::COLUMNS.iter().any(|column| *column == attribute)
    }
}

/// Declares an entity marker type, its column list, and a typed accessor
/// trait implemented for `Record<Entity>`.
///
/// A column named like an inherent `Record` method (`id`, `save`, ...) is
/// shadowed by that method; call its accessor through the trait instead.
///
/// ```
/// use lazyrecord_core::entity;
///
/// entity! {
///     /// Application user.
///     pub struct User: UserColumns {
///         name: String => set_name,
///         age: Option<i64> => set_age,
///     }
/// }
///
/// # use lazyrecord_core::Entity;
/// assert_eq!(User::table_name(), "user");
/// assert_eq!(User::COLUMNS, &["name", "age"]);
/// ```
#[macro_export]
macro_rules! entity {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident : $accessors:ident {
            $(
                $(#[$field_meta:meta])*
                $field:ident : $ty:ty => $setter:ident
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        $vis struct $name;

        impl $crate::Entity for $name {
            const NAME: &'static str = stringify!($name);
            const COLUMNS: &'static [&'static str] = &[$(stringify!($field)),*];
        }

        $vis trait $accessors {
            $(
                $(#[$field_meta])*
                fn $field(&mut self) -> $crate::OrmResult<$ty>;
                fn $setter(&mut self, value: impl Into<$ty>) -> $crate::OrmResult<()>;
            )*
        }

        impl $accessors for $crate::Record<$name> {
            $(
                fn $field(&mut self) -> $crate::OrmResult<$ty> {
                    self.get_as::<$ty>(stringify!($field))
                }

                fn $setter(&mut self, value: impl Into<$ty>) -> $crate::OrmResult<()> {
                    let value: $ty = value.into();
                    self.set(stringify!($field), value)
                }
            )*
        }
    };
}
