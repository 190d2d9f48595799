/// Static description of a table-backed type.
///
/// Implement it on a marker type and tune the attribute rules with the
/// associated constants:
///
/// ```ignore
/// struct User;
///
/// impl Entity for User {
///     const FILLABLE: &'static [&'static str] = &["name", "email"];
///     const GUARDED: &'static [&'static str] = &["role"];
///     const HIDDEN: &'static [&'static str] = &["password"];
/// }
///
/// assert_eq!(User::table_name(), "users");
/// ```
pub trait Entity {
    /// Explicit table name. When `None` the name is derived from the type name.
    const TABLE: Option<&'static str> = None;

    const PRIMARY_KEY: &'static str = "id";

    /// Attributes that may be written through `set`, `fill`, `create` and `update`.
    const FILLABLE: &'static [&'static str] = &[];

    /// Attributes that are never written through mass assignment, even when fillable.
    const GUARDED: &'static [&'static str] = &[];

    /// Attributes left out of projections and refused by `get`.
    const HIDDEN: &'static [&'static str] = &[];

    fn table_name() -> String {
        match Self::TABLE {
            Some(table) if !table.is_empty() => table.to_string(),
            _ => derive_table_name(std::any::type_name::<Self>()),
        }
    }
}

/// `Test` -> `tests`, `BlogPost` -> `blogPosts`.
///
/// Takes the last path segment of a type name, lower-cases its first character
/// and appends `s`.
pub fn derive_table_name(type_name: &str) -> String {
    let base = type_name.split('<').next().unwrap_or(type_name);
    let base = base.rsplit("::").next().unwrap_or(base);

    let mut chars = base.chars();
    let mut name = String::with_capacity(base.len() + 1);
    if let Some(first) = chars.next() {
        name.extend(first.to_lowercase());
        name.push_str(chars.as_str());
    }
    name.push('s');
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Test;
    impl Entity for Test {}

    struct Person;
    impl Entity for Person {
        const TABLE: Option<&'static str> = Some("people");
    }

    #[test]
    fn derives_plural_lower_first_name() {
        assert_eq!(Test::table_name(), "tests");
        assert_eq!(derive_table_name("app::models::BlogPost"), "blogPosts");
        assert_eq!(derive_table_name("Wrapper<app::Inner>"), "wrappers");
    }

    #[test]
    fn explicit_table_wins() {
        assert_eq!(Person::table_name(), "people");
    }
}
