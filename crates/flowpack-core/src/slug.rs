/// 人間可読の名前をファイル名・イメージ名に安全なスラッグへ正規化
///
/// 英数字以外の連続をひとつの `-` にまとめ、小文字化し、
/// 先頭と末尾の `-` を取り除きます。
///
/// # Examples
/// - `My Flow!` -> `my-flow`
/// - `2026-08-05T10:10:10.000000+00:00` -> `2026-08-05t10-10-10-000000-00-00`
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_separator = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_separator = true;
        }
    }

    slug
}
