//! Capacity table parser
//!
//! Turns the HTML returned by the `get_view` endpoint into [`CapacitySlot`]s.
//!
//! # Markup
//!
//! ```text
//! <tbody>
//!   <tr>
//!     <td>Sabtu, 18 Oktober 2025</td>
//!     <td><span class="text-red">Kuota Penuh</span> <span class="hide"></span></td>
//!   </tr>
//! </tbody>
//! ```
//!
//! The site hides the remaining quota ("sisa") inside a visually hidden
//! container, and leaves that container empty when the quota is gone. A
//! missing number is therefore a signal, not a parse failure: full is decided
//! from the status text or the hidden-container marker on the row itself.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Node, Selector};

use crate::error::{Error, Result};
use crate::models::{CapacitySlot, SlotStatus};
use crate::services::dates::normalize_local_date;

static ROW_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tbody tr").expect("valid row selector"));

static CELL_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td").expect("valid cell selector"));

static STATUS_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".text-red, .text-green, .text-blue").expect("valid status selector")
});

/// Classes the site (and Bootstrap) use to hide content visually
const HIDDEN_CLASSES: &[&str] = &["hide", "hidden", "d-none", "sr-only", "visually-hidden"];

/// Status fragments meaning the quota is gone
const FULL_MARKERS: &[&str] = &["penuh"];

/// Status fragments meaning "not (yet) available"; checked before the
/// availability words because they contain them
const NOT_AVAILABLE_MARKERS: &[&str] = &["tidak tersedia", "belum tersedia", "not available"];

const AVAILABLE_MARKERS: &[&str] = &["tersedia", "tersisa", "available"];

/// Parse the capacity view into slots, in table order
///
/// Returns an empty list when the table is absent or no row has the expected
/// shape; the caller decides what that means.
///
/// # Errors
///
/// Returns `Error::Markup` when the body is not markup at all (for example a
/// plain-text or JSON error payload).
pub fn parse_capacity_page(html: &str) -> Result<Vec<CapacitySlot>> {
    let trimmed = html.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    if !trimmed.contains('<') {
        return Err(Error::markup(format!(
            "response is not HTML ({} bytes, starts with {:?})",
            trimmed.len(),
            trimmed.chars().take(40).collect::<String>()
        )));
    }

    let document = Html::parse_document(html);
    let slots: Vec<CapacitySlot> = document
        .select(&ROW_SELECTOR)
        .filter_map(CapacityRow::from_element)
        .filter_map(|row| row.into_slot())
        .collect();

    log::debug!("[parser] {} slot(s) parsed", slots.len());
    Ok(slots)
}

/// Find the slot for `date` in an already parsed page
pub fn find_slot(slots: &[CapacitySlot], date: chrono::NaiveDate) -> Option<&CapacitySlot> {
    slots.iter().find(|slot| slot.date == date)
}

// ============================================================================
// Row
// ============================================================================

/// A table row with at least a date cell and a status cell
struct CapacityRow<'a> {
    date_cell: ElementRef<'a>,
    status_cell: ElementRef<'a>,
}

impl<'a> CapacityRow<'a> {
    fn from_element(row: ElementRef<'a>) -> Option<Self> {
        let mut cells = row.select(&CELL_SELECTOR);
        let date_cell = cells.next()?;
        let status_cell = cells.next()?;
        Some(Self {
            date_cell,
            status_cell,
        })
    }

    fn label(&self) -> String {
        visible_text(self.date_cell)
    }

    fn status_text(&self) -> String {
        match self.status_cell.select(&STATUS_SELECTOR).next() {
            Some(status) => visible_text(status),
            None => visible_text(self.status_cell),
        }
    }

    /// First visually hidden container in the status cell
    fn hidden_remaining(&self) -> Option<ElementRef<'a>> {
        self.status_cell
            .descendants()
            .filter_map(ElementRef::wrap)
            .find(|el| is_hidden(*el))
    }

    /// Whether the row carries the hidden-remaining container at all
    fn has_hidden_remaining_marker(&self) -> bool {
        self.hidden_remaining().is_some()
    }

    /// Number inside the hidden container, if it holds one
    fn hidden_remaining_value(&self) -> Option<u32> {
        let raw = self.hidden_remaining()?.text().collect::<String>();
        let raw = raw.trim();
        if !raw.is_empty() && raw.chars().all(|c| c.is_ascii_digit()) {
            raw.parse().ok()
        } else {
            None
        }
    }

    /// Number rendered visibly in the status cell (e.g. "Sisa 5")
    fn visible_remaining_value(&self) -> Option<u32> {
        first_number(&visible_text(self.status_cell))
    }

    fn into_slot(self) -> Option<CapacitySlot> {
        let label = self.label();
        let date = match normalize_local_date(&label) {
            Ok(date) => date,
            Err(e) => {
                log::debug!("[parser] skipping row '{}': {}", label, e);
                return None;
            }
        };

        let status_text = self.status_text();
        let remaining = self
            .visible_remaining_value()
            .or_else(|| self.hidden_remaining_value());
        let status = classify(
            &status_text,
            remaining,
            self.has_hidden_remaining_marker(),
        );

        Some(CapacitySlot::new(date, label, status_text, status, remaining))
    }
}

/// Decide the slot status from its signals
///
/// A hidden container without a number counts as full unless the status text
/// claims availability or says the date is not open yet.
fn classify(status_text: &str, remaining: Option<u32>, hidden_marker: bool) -> SlotStatus {
    let lower = status_text.to_lowercase();
    let says_full = FULL_MARKERS.iter().any(|m| lower.contains(m));
    let says_not_available = NOT_AVAILABLE_MARKERS.iter().any(|m| lower.contains(m));
    let says_available =
        !says_not_available && AVAILABLE_MARKERS.iter().any(|m| lower.contains(m));

    let hidden_without_number = hidden_marker && remaining.is_none();

    if says_full || remaining == Some(0) {
        return SlotStatus::Full;
    }
    if says_not_available {
        return SlotStatus::Unknown;
    }
    if hidden_without_number && !says_available {
        return SlotStatus::Full;
    }
    if says_available || remaining.is_some_and(|n| n > 0) {
        return SlotStatus::Available;
    }
    SlotStatus::Unknown
}

// ============================================================================
// Markup helpers
// ============================================================================

fn is_hidden(el: ElementRef<'_>) -> bool {
    let element = el.value();
    if element.classes().any(|c| HIDDEN_CLASSES.contains(&c)) {
        return true;
    }
    if element.attr("hidden").is_some() {
        return true;
    }
    element
        .attr("style")
        .map(|style| {
            let compact: String = style
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect::<String>()
                .to_lowercase();
            compact.contains("display:none") || compact.contains("visibility:hidden")
        })
        .unwrap_or(false)
}

/// Text of `root` without the content of hidden descendants, whitespace collapsed
fn visible_text(root: ElementRef<'_>) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for node in root.descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node
            .ancestors()
            .take_while(|ancestor| ancestor.id() != root.id())
            .filter_map(ElementRef::wrap)
            .any(is_hidden);
        if !hidden {
            parts.push(&**text);
        }
    }
    normalize_ws(&parts.join(" "))
}

fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn first_number(s: &str) -> Option<u32> {
    let digits: String = s
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn table(rows: &str) -> String {
        format!(
            "<table class=\"table\"><thead><tr><th>Tanggal</th><th>Kuota</th></tr></thead>\
             <tbody>{}</tbody></table>",
            rows
        )
    }

    #[test]
    fn test_available_with_hidden_number() {
        let html = table(
            r#"<tr><td>Sabtu, 18 Oktober 2025</td>
               <td><span class="text-green">Tersedia</span> <span class="hide">5</span></td></tr>"#,
        );
        let slots = parse_capacity_page(&html).unwrap();
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].date, date(2025, 10, 18));
        assert_eq!(slots[0].label, "Sabtu, 18 Oktober 2025");
        assert_eq!(slots[0].status_text, "Tersedia");
        assert_eq!(slots[0].status, SlotStatus::Available);
        assert_eq!(slots[0].remaining, Some(5));
    }

    #[test]
    fn test_kuota_penuh_with_hidden_container_is_full() {
        let html = table(
            r#"<tr><td>18 Oktober 2025</td>
               <td><span class="text-red">Kuota Penuh</span><span class="hide"></span></td></tr>"#,
        );
        let slots = parse_capacity_page(&html).unwrap();
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].status, SlotStatus::Full);
        assert_eq!(slots[0].remaining, None);
    }

    #[test]
    fn test_kuota_penuh_ignores_hidden_number() {
        let html = table(
            r#"<tr><td>18 Oktober 2025</td>
               <td><span class="text-red">Kuota Penuh</span><span class="hide">37</span></td></tr>"#,
        );
        let slots = parse_capacity_page(&html).unwrap();
        assert_eq!(slots[0].status, SlotStatus::Full);
        assert_eq!(slots[0].remaining, None);
    }

    #[test]
    fn test_hidden_marker_alone_means_full() {
        let html = table(
            r#"<tr><td>19 Oktober 2025</td>
               <td><span class="text-blue">-</span><div style="display: none"></div></td></tr>"#,
        );
        let slots = parse_capacity_page(&html).unwrap();
        assert_eq!(slots[0].status, SlotStatus::Full);
    }

    #[test]
    fn test_hidden_attribute_and_d_none_are_markers() {
        let html = table(
            r#"<tr><td>20 Oktober 2025</td><td>Kuota Penuh <i hidden></i></td></tr>
               <tr><td>21 Oktober 2025</td><td>Kuota Penuh <b class="d-none"></b></td></tr>"#,
        );
        let slots = parse_capacity_page(&html).unwrap();
        assert_eq!(slots.len(), 2);
        assert!(slots.iter().all(|s| s.status == SlotStatus::Full));
    }

    #[test]
    fn test_visible_sisa_number() {
        let html = table(r#"<tr><td>1 November 2025</td><td>Sisa 12</td></tr>"#);
        let slots = parse_capacity_page(&html).unwrap();
        assert_eq!(slots[0].status, SlotStatus::Available);
        assert_eq!(slots[0].remaining, Some(12));
    }

    #[test]
    fn test_zero_remaining_is_full() {
        let html = table(
            r#"<tr><td>2 November 2025</td>
               <td><span class="text-green">Tersedia</span><span class="hide">0</span></td></tr>"#,
        );
        let slots = parse_capacity_page(&html).unwrap();
        assert_eq!(slots[0].status, SlotStatus::Full);
        assert_eq!(slots[0].remaining, None);
    }

    #[test]
    fn test_available_without_number() {
        let html = table(
            r#"<tr><td>3 November 2025</td><td><span class="text-green">Tersedia</span></td></tr>"#,
        );
        let slots = parse_capacity_page(&html).unwrap();
        assert_eq!(slots[0].status, SlotStatus::Available);
        assert_eq!(slots[0].remaining, None);
    }

    #[test]
    fn test_not_yet_available_is_unknown() {
        let html = table(
            r#"<tr><td>4 November 2025</td><td><span class="text-blue">Belum Tersedia</span></td></tr>"#,
        );
        let slots = parse_capacity_page(&html).unwrap();
        assert_eq!(slots[0].status, SlotStatus::Unknown);
    }

    #[test]
    fn test_not_yet_available_with_empty_hidden_container_is_unknown() {
        let html = table(
            r#"<tr><td>5 November 2025</td>
               <td><span class="text-blue">Belum Tersedia</span> <span class="hide"></span></td></tr>"#,
        );
        let slots = parse_capacity_page(&html).unwrap();
        assert_eq!(slots[0].status, SlotStatus::Unknown);
        assert_eq!(slots[0].remaining, None);
    }

    #[test]
    fn test_rows_keep_table_order_and_skip_bad_rows() {
        let html = table(
            r#"<tr><td>Rabu, 1 Oktober 2025</td><td>Tersedia</td></tr>
               <tr><td colspan="2">Keterangan</td></tr>
               <tr><td>Catatan</td><td>-</td></tr>
               <tr><td>Kamis, 2 Oktober 2025</td><td>Kuota Penuh</td></tr>"#,
        );
        let slots = parse_capacity_page(&html).unwrap();
        let dates: Vec<_> = slots.iter().map(|s| s.date).collect();
        assert_eq!(dates, vec![date(2025, 10, 1), date(2025, 10, 2)]);
    }

    #[test]
    fn test_rows_without_tbody_tag() {
        let html = r#"<table><tr><td>5 Oktober 2025</td><td>Tersedia</td></tr></table>"#;
        let slots = parse_capacity_page(html).unwrap();
        assert_eq!(slots.len(), 1);
    }

    #[test]
    fn test_missing_table_is_empty() {
        assert!(parse_capacity_page("<div>Tidak ada data</div>").unwrap().is_empty());
        assert!(parse_capacity_page("").unwrap().is_empty());
    }

    #[test]
    fn test_plain_text_body_is_markup_error() {
        let err = parse_capacity_page("{\"error\": \"bad request\"}").unwrap_err();
        assert!(matches!(err, Error::Markup(_)));
    }

    #[test]
    fn test_parsing_is_idempotent() {
        let html = table(
            r#"<tr><td>18 Oktober 2025</td><td><span class="text-green">Tersedia</span><span class="hide">5</span></td></tr>
               <tr><td>19 Oktober 2025</td><td><span class="text-red">Kuota Penuh</span><span class="hide"></span></td></tr>"#,
        );
        let first = parse_capacity_page(&html).unwrap();
        let second = parse_capacity_page(&html).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_find_slot() {
        let html = table(
            r#"<tr><td>18 Oktober 2025</td><td>Tersedia</td></tr>
               <tr><td>19 Oktober 2025</td><td>Kuota Penuh</td></tr>"#,
        );
        let slots = parse_capacity_page(&html).unwrap();
        assert_eq!(find_slot(&slots, date(2025, 10, 19)).unwrap().status, SlotStatus::Full);
        assert!(find_slot(&slots, date(2025, 10, 20)).is_none());
    }
}
