pub mod brand;
pub mod car;
pub mod category;
pub mod review;
pub mod user;

/// Uses the supplied slug when it has content, otherwise derives one from `name`.
pub(crate) fn slug_or_derive(slug: Option<&str>, name: &str) -> String {
    match slug.map(str::trim).filter(|s| !s.is_empty()) {
        Some(slug) => slug::slugify(slug),
        None => slug::slugify(name),
    }
}
