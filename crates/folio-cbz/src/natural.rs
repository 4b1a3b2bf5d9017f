//! Natural (numeric-aware, case-insensitive) ordering of entry names.
//!
//! `page2.jpg` sorts before `page10.jpg`; `Page1` and `page1` compare by
//! content first and fall back to a byte comparison so the order is total
//! and stable for identical input.

use std::cmp::Ordering;
use std::iter::Peekable;
use std::str::Chars;

/// Compare two names in natural order.
///
/// # Examples
///
/// ```rust
/// use folio_cbz::natural_cmp;
/// use std::cmp::Ordering;
///
/// assert_eq!(natural_cmp("page2.jpg", "page10.jpg"), Ordering::Less);
/// assert_eq!(natural_cmp("IMG_010", "img_9"), Ordering::Greater);
/// ```
#[must_use = "returns the ordering"]
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut ia = a.chars().peekable();
    let mut ib = b.chars().peekable();

    loop {
        match (ia.peek().copied(), ib.peek().copied()) {
            (None, None) => break,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(ca), Some(cb)) if ca.is_ascii_digit() && cb.is_ascii_digit() => {
                let da = take_digits(&mut ia);
                let db = take_digits(&mut ib);
                let ord = cmp_numeric(&da, &db);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(ca), Some(cb)) => {
                let ord = fold(ca).cmp(&fold(cb));
                if ord != Ordering::Equal {
                    return ord;
                }
                ia.next();
                ib.next();
            }
        }
    }

    // Equal under folding: "01" vs "1", "A" vs "a". Byte order keeps the
    // result total.
    a.cmp(b)
}

fn take_digits(it: &mut Peekable<Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = it.peek().copied().filter(char::is_ascii_digit) {
        digits.push(c);
        it.next();
    }
    digits
}

/// Compare digit runs by value without parsing, so long runs cannot overflow.
fn cmp_numeric(a: &str, b: &str) -> Ordering {
    let ta = a.trim_start_matches('0');
    let tb = b.trim_start_matches('0');
    ta.len()
        .cmp(&tb.len())
        .then_with(|| ta.cmp(tb))
        // fewer leading zeros first
        .then_with(|| a.len().cmp(&b.len()))
}

fn fold(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(names: &[&str]) -> Vec<String> {
        let mut v: Vec<String> = names.iter().map(|s| (*s).to_string()).collect();
        v.sort_by(|a, b| natural_cmp(a, b));
        v
    }

    #[test]
    fn test_numeric_runs() {
        assert_eq!(
            sorted(&["page10.jpg", "page2.jpg", "page1.jpg"]),
            vec!["page1.jpg", "page2.jpg", "page10.jpg"]
        );
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(
            sorted(&["b.png", "A.png", "a2.png"]),
            vec!["A.png", "a2.png", "b.png"]
        );
    }

    #[test]
    fn test_leading_zeros() {
        assert_eq!(natural_cmp("007", "7"), Ordering::Greater);
        assert_eq!(natural_cmp("007", "8"), Ordering::Less);
        assert_eq!(natural_cmp("x99999999999999999999999", "x100000000000000000000000"), Ordering::Less);
    }

    #[test]
    fn test_directories_sort_as_prefix() {
        assert_eq!(
            sorted(&["ch10/01.jpg", "ch2/01.jpg", "ch2/10.jpg", "ch2/2.jpg"]),
            vec!["ch2/01.jpg", "ch2/2.jpg", "ch2/10.jpg", "ch10/01.jpg"]
        );
    }

    #[test]
    fn test_prefix_sorts_first() {
        assert_eq!(natural_cmp("page", "page1"), Ordering::Less);
        assert_eq!(natural_cmp("", "a"), Ordering::Less);
    }
}
