/// Turns a participant name into a URL slug: lowercase ASCII letters and
/// digits separated by single dashes.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars().flat_map(fold_char) {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        return "participant".to_string();
    }
    slug
}

// German umlauts are common in participant names.
fn fold_char(c: char) -> Vec<char> {
    match c {
        'ä' | 'Ä' => vec!['a', 'e'],
        'ö' | 'Ö' => vec!['o', 'e'],
        'ü' | 'Ü' => vec!['u', 'e'],
        'ß' => vec!['s', 's'],
        'à' | 'á' | 'â' | 'À' | 'Á' | 'Â' => vec!['a'],
        'è' | 'é' | 'ê' | 'È' | 'É' | 'Ê' => vec!['e'],
        'ì' | 'í' | 'î' => vec!['i'],
        'ò' | 'ó' | 'ô' => vec!['o'],
        'ù' | 'ú' | 'û' => vec!['u'],
        'ç' => vec!['c'],
        'ñ' => vec!['n'],
        other => vec![other],
    }
}

/// Returns `base`, or `base-2`, `base-3`, ... whichever is not yet taken.
pub fn unique_slug(base: &str, taken: &[String]) -> String {
    if !taken.iter().any(|t| t == base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{base}-{n}"))
        .find(|candidate| !taken.iter().any(|t| t == candidate))
        .unwrap_or_else(|| base.to_string())
}
