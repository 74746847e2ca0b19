// ABOUTME: Utility functions for folder naming
// ABOUTME: Provides consistent local folder names for downloaded content

pub fn slugify(text: &str) -> String {
    slug::slugify(text)
}
