//! Extraction of a snapshot from a court case page.
//!
//! Page layout:
//!
//! ```text
//! #content
//!   div.title        "<sub_category> - <instance>"
//!   div.casenumber   "ДЕЛО № <case_number> ~ <material_number>"
//!   ul > li*N        tab headers
//!   div#cont1..N     tab bodies; tab 1 holds a label/value table
//! ```

use casewatch_core::errors::{ExError, ExErrorKind};
use casewatch_core::{FieldName, Section, SectionId, Snapshot};
use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;

/// Tab-1 table labels and the core field each one feeds.
const LABELS: &[(&str, FieldName)] = &[
    ("Дата поступления", FieldName::DateOfReceipt),
    ("Категория дела", FieldName::CategoryOfCase),
    ("Судья", FieldName::Judge),
    ("Дата рассмотрения", FieldName::DateOfConsideration),
    ("Результат рассмотрения", FieldName::ResultOfConsideration),
    ("Признак рассмотрения дела", FieldName::IndicationOfConsideration),
    ("Состав суда", FieldName::CourtComposition),
];

/// Parse a case page into a snapshot.
///
/// `record_url` is the page's address; links on the page are relative to
/// its origin (everything before `/modules`).
///
/// # Errors
///
/// Returns `ExErrorKind::Extraction` when the page has no `#content` element.
pub fn extract_case_page(
    html: &str,
    record_url: &str,
    captured_at: DateTime<Utc>,
) -> Result<Snapshot, ExError> {
    let document = Html::parse_document(html);
    let content = document
        .select(&selector("#content")?)
        .next()
        .ok_or_else(|| {
            ExError::new(ExErrorKind::Extraction)
                .with_op("extract_case_page")
                .with_record_id(record_url)
                .with_message("page has no #content element")
        })?;

    let mut snapshot = Snapshot::new(captured_at);

    if let Some(title) = first_text(content, "div.title")? {
        let (sub_category, instance) = split_title(&title);
        set(&mut snapshot, FieldName::SubCategory, sub_category);
        set(&mut snapshot, FieldName::Instance, instance);
    }

    if let Some(number) = first_text(content, "div.casenumber")? {
        let (case_number, material_number) = split_case_number(&number);
        set(&mut snapshot, FieldName::CaseNumber, case_number);
        set(&mut snapshot, FieldName::MaterialNumber, material_number);
    }

    let tab_count = match content.select(&selector("ul")?).next() {
        Some(list) => list.select(&selector("li")?).count(),
        None => 0,
    };

    for n in 1..=tab_count {
        let Some(body) = content.select(&selector(&format!("div#cont{}", n))?).next() else {
            tracing::debug!(record_url, tab = n, "tab body missing, skipped");
            continue;
        };

        let mut section = Section::text(body.inner_html());
        if n == 1 {
            let labels = labelled_cells(body)?;
            for (label, field) in LABELS {
                if let Some(Some(value)) = labels.get(*label) {
                    snapshot.core_fields.set(*field, Some(value.clone()));
                }
            }
            set(&mut snapshot, FieldName::Uid, first_text(body, "u")?);
            let href = body
                .select(&selector("a[href]")?)
                .next()
                .and_then(|a| a.value().attr("href"));
            set(
                &mut snapshot,
                FieldName::UidLink,
                href.map(|h| absolute_link(record_url, h)),
            );
            section = section.with_fields(labels);
        }
        snapshot.sections.insert(SectionId::from_index(n), section);
    }

    tracing::debug!(
        record_url,
        tab_count,
        field_count = snapshot.core_fields.len(),
        "case page extracted"
    );
    Ok(snapshot)
}

/// `"Гражданские дела - первая инстанция"` → (`Гражданские дела`, `первая инстанция`)
fn split_title(title: &str) -> (Option<String>, Option<String>) {
    match title.split_once('-') {
        Some((sub_category, instance)) => (non_empty(sub_category), non_empty(instance)),
        None => (non_empty(title), None),
    }
}

/// `"ДЕЛО № 2-15/2024 ~ М-7/2024"` → (`2-15/2024`, `М-7/2024`)
fn split_case_number(text: &str) -> (Option<String>, Option<String>) {
    let rest = match text.find('№') {
        Some(pos) => &text[pos + '№'.len_utf8()..],
        None => text,
    };
    match rest.split_once('~') {
        Some((case_number, material)) => (non_empty(case_number), non_empty(material)),
        None => (non_empty(rest), None),
    }
}

/// Rows whose first cell holds a `<b>` label, mapped to the next cell's text.
fn labelled_cells(body: ElementRef<'_>) -> Result<BTreeMap<String, Option<String>>, ExError> {
    let row_sel = selector("tr")?;
    let cell_sel = selector("td")?;
    let label_sel = selector("b")?;

    let mut labels = BTreeMap::new();
    for row in body.select(&row_sel) {
        let cells: Vec<ElementRef<'_>> = row.select(&cell_sel).collect();
        let Some(label) = cells
            .first()
            .and_then(|c| c.select(&label_sel).next())
            .and_then(|b| non_empty(&collapse(b.text())))
        else {
            continue;
        };
        let value = cells.get(1).and_then(|c| non_empty(&collapse(c.text())));
        labels.entry(label).or_insert(value);
    }
    Ok(labels)
}

fn absolute_link(record_url: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    let origin = match record_url.find("/modules") {
        Some(pos) => &record_url[..pos],
        None => record_url.trim_end_matches('/'),
    };
    format!("{}{}", origin, href)
}

fn first_text(root: ElementRef<'_>, css: &str) -> Result<Option<String>, ExError> {
    Ok(root
        .select(&selector(css)?)
        .next()
        .and_then(|el| non_empty(&collapse(el.text()))))
}

fn set(snapshot: &mut Snapshot, field: FieldName, value: Option<String>) {
    if value.is_some() {
        snapshot.core_fields.set(field, value);
    }
}

fn collapse<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn selector(css: &str) -> Result<Selector, ExError> {
    Selector::parse(css).map_err(|e| {
        ExError::new(ExErrorKind::Internal)
            .with_op("extract_case_page")
            .with_message(format!("invalid selector `{}`: {:?}", css, e))
    })
}
