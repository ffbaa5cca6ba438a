use std::fmt::Write;

use crate::library::{Category, LibraryItem};
use crate::sync_result::SyncResult;

const EMPTY_PLACEHOLDER: &str = "-";

fn write_block(out: &mut String, heading: &str, items: &[LibraryItem]) {
    let _ = writeln!(out, "{}", heading);
    if items.is_empty() {
        let _ = writeln!(out, "{}", EMPTY_PLACEHOLDER);
    } else {
        for item in items {
            let _ = writeln!(out, "{}", item.display_name());
        }
    }
}

/// Renders the outcome of a two-sided category sync, one block per side and
/// direction.
pub fn render_sync_report(category: Category, result: &SyncResult) -> String {
    let label = category.label();
    let blocks = [
        (
            format!("{} added to the left side:", label),
            result.items_added_to_left(),
        ),
        (
            format!("{} deleted from the left side:", label),
            result.items_deleted_from_left(),
        ),
        (
            format!("{} added to the right side:", label),
            result.items_added_to_right(),
        ),
        (
            format!("{} deleted from the right side:", label),
            result.items_deleted_from_right(),
        ),
    ];

    let mut out = String::new();
    for (index, (heading, items)) in blocks.iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        write_block(&mut out, heading, items);
    }
    out
}

/// Renders the outcome of following the artists of a side's saved albums.
pub fn render_follow_report(result: &SyncResult) -> String {
    let mut out = String::new();
    write_block(&mut out, "Artists added:", result.items_added_to_right());
    write_block(&mut out, "Artists deleted:", result.items_deleted_from_right());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_sync_report() {
        let mut result = SyncResult::new();
        result.add_items_added_to_left(vec![
            LibraryItem::album("A1", "Blue Train"),
            LibraryItem::album("A2", "Kind of Blue"),
        ]);
        result.add_items_deleted_from_right(vec![LibraryItem::album("A3", "Giant Steps")]);

        let report = render_sync_report(Category::Album, &result);
        let expected = "\
Albums added to the left side:
Blue Train
Kind of Blue

Albums deleted from the left side:
-

Albums added to the right side:
-

Albums deleted from the right side:
Giant Steps
";
        assert_eq!(report, expected);
    }

    #[test]
    fn test_render_sync_report_uses_category_label() {
        let report = render_sync_report(Category::Show, &SyncResult::new());
        assert!(report.starts_with("Shows added to the left side:\n-\n"));
        assert_eq!(report.matches(EMPTY_PLACEHOLDER).count(), 4);
    }

    #[test]
    fn test_render_follow_report() {
        let mut result = SyncResult::new();
        result.add_items_added_to_right(vec![LibraryItem::artist("AR1", "Nina Simone")]);

        let report = render_follow_report(&result);
        assert_eq!(report, "Artists added:\nNina Simone\nArtists deleted:\n-\n");
    }
}
