//! Listing page traversal: page URL generation and report-link scanning.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use scraper::{Html, Selector};
use tracing::{debug, info, warn};

use crate::models::ReportReference;

const LISTING_PATH: &str = "/markets/oil_products/trades/results/";
const LISTING_AJAX_ID: &str = "d609bce6ada86eff0b6f7e49e6bae904";
const DATE_FORMAT: &str = "%d.%m.%Y";

/// Substring that marks a report link as an oil-products spreadsheet.
pub const OIL_REPORT_MARKER: &str = "oil_xls";

lazy_static! {
    static ref ENTRY: Selector =
        Selector::parse("div.accordeon-inner__item").expect("static selector");
    static ref REPORT_LINK: Selector =
        Selector::parse("a.accordeon-inner__item-title.link.xls").expect("static selector");
    static ref DATE_LABEL: Selector = Selector::parse("span").expect("static selector");
}

/// URLs for listing pages `1..=max_pages`, in page order.
pub fn listing_page_urls(base_url: &str, max_pages: u32) -> Vec<String> {
    let base = base_url.trim_end_matches('/');
    (1..=max_pages)
        .map(|page| {
            format!(
                "{}{}?page=page-{}&bxajaxid={}",
                base, LISTING_PATH, page, LISTING_AJAX_ID
            )
        })
        .collect()
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanOutcome {
    /// References in page order, all dated on or after the cutoff.
    pub reports: Vec<ReportReference>,
    /// Set when an entry older than the cutoff ended the scan of this page.
    pub stop: bool,
}

#[derive(Debug, Clone)]
pub struct ListingPageScanner {
    base_url: String,
    cutoff: NaiveDate,
}

impl ListingPageScanner {
    pub fn new(base_url: impl Into<String>, cutoff: NaiveDate) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, cutoff }
    }

    pub fn cutoff(&self) -> NaiveDate {
        self.cutoff
    }

    /// Entries are date-descending, so the first entry older than the cutoff
    /// ends the scan; references collected before it are kept.
    pub fn scan(&self, html: &str) -> ScanOutcome {
        let doc = Html::parse_document(html);
        let mut outcome = ScanOutcome::default();

        for block in doc.select(&ENTRY) {
            let Some(anchor) = block.select(&REPORT_LINK).next() else {
                continue;
            };
            let Some(label) = block.select(&DATE_LABEL).next() else {
                continue;
            };

            let label_text = label.text().collect::<String>();
            let label_text = label_text.trim();
            let date = match NaiveDate::parse_from_str(label_text, DATE_FORMAT) {
                Ok(d) => d,
                Err(e) => {
                    warn!(label = label_text, error = %e, "Unparseable report date, skipping entry");
                    continue;
                }
            };

            if date < self.cutoff {
                info!(%date, cutoff = %self.cutoff, "Report older than cutoff, stopping page scan");
                outcome.stop = true;
                break;
            }

            let href = anchor.value().attr("href").unwrap_or("").trim();
            if href.is_empty() {
                debug!(%date, "Report anchor without href, skipping entry");
                continue;
            }

            let url = self.absolute_url(href);
            let is_oil_report = url.contains(OIL_REPORT_MARKER);
            outcome.reports.push(ReportReference {
                url,
                date,
                is_oil_report,
            });
        }

        outcome
    }

    fn absolute_url(&self, href: &str) -> String {
        if href.starts_with("http://") || href.starts_with("https://") {
            href.to_string()
        } else if href.starts_with('/') {
            format!("{}{}", self.base_url, href)
        } else {
            format!("{}/{}", self.base_url, href)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn entry(href: &str, date: &str) -> String {
        format!(
            r#"<div class="accordeon-inner__item">
                <a href="{href}" class="accordeon-inner__item-title link xls">Бюллетень</a>
                <span>{date}</span>
            </div>"#
        )
    }

    fn page(entries: &[String]) -> String {
        format!("<html><body>{}</body></html>", entries.concat())
    }

    #[test]
    fn generates_one_url_per_page() {
        let urls = listing_page_urls("https://spimex.com", 2);
        assert_eq!(urls.len(), 2);
        assert!(urls[0].contains("page=page-1"));
        assert!(urls[1].contains("page=page-2"));
        assert!(urls[0].starts_with("https://spimex.com/markets/oil_products/trades/results/"));
    }

    #[test]
    fn zero_pages_generates_nothing() {
        assert!(listing_page_urls("https://spimex.com/", 0).is_empty());
    }

    #[test]
    fn stops_at_first_entry_before_cutoff() {
        let html = page(&[
            entry("/upload/reports/oil_xls/oil_xls_20230105162000.xls", "05.01.2023"),
            entry("/upload/reports/oil_xls/oil_xls_20230101162000.xls", "01.01.2023"),
            entry("/upload/reports/oil_xls/oil_xls_20221220162000.xls", "20.12.2022"),
        ]);
        let scanner = ListingPageScanner::new("https://spimex.com", ymd(2023, 1, 1));

        let outcome = scanner.scan(&html);

        assert!(outcome.stop);
        let dates: Vec<_> = outcome.reports.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![ymd(2023, 1, 5), ymd(2023, 1, 1)]);
        assert_eq!(
            outcome.reports[0].url,
            "https://spimex.com/upload/reports/oil_xls/oil_xls_20230105162000.xls"
        );
    }

    #[test]
    fn skips_blocks_without_report_anchor() {
        let html = page(&[
            r#"<div class="accordeon-inner__item"><a href="/x.pdf" class="link pdf">PDF</a><span>05.01.2023</span></div>"#
                .to_string(),
            entry("/upload/reports/oil_xls/a.xls", "04.01.2023"),
        ]);
        let outcome = ListingPageScanner::new("https://spimex.com", ymd(2023, 1, 1)).scan(&html);
        assert!(!outcome.stop);
        assert_eq!(outcome.reports.len(), 1);
        assert_eq!(outcome.reports[0].date, ymd(2023, 1, 4));
    }

    #[test]
    fn bad_date_label_skips_only_that_entry() {
        let html = page(&[
            entry("/upload/reports/oil_xls/a.xls", "2023/01/05"),
            entry("/upload/reports/oil_xls/b.xls", "04.01.2023"),
        ]);
        let outcome = ListingPageScanner::new("https://spimex.com", ymd(2023, 1, 1)).scan(&html);
        assert!(!outcome.stop);
        assert_eq!(outcome.reports.len(), 1);
        assert!(outcome.reports[0].url.ends_with("b.xls"));
    }

    #[test]
    fn flags_only_oil_reports() {
        let html = page(&[
            entry("/upload/reports/oil_xls/oil_xls_20230105.xls", "05.01.2023"),
            entry("/upload/reports/gas_xls/gas_20230105.xls", "05.01.2023"),
        ]);
        let outcome = ListingPageScanner::new("https://spimex.com", ymd(2023, 1, 1)).scan(&html);
        let flags: Vec<_> = outcome.reports.iter().map(|r| r.is_oil_report).collect();
        assert_eq!(flags, vec![true, false]);
    }

    #[test]
    fn keeps_absolute_hrefs() {
        let html = page(&[entry(
            "https://cdn.spimex.com/upload/reports/oil_xls/a.xls",
            "05.01.2023",
        )]);
        let outcome = ListingPageScanner::new("https://spimex.com", ymd(2023, 1, 1)).scan(&html);
        assert_eq!(
            outcome.reports[0].url,
            "https://cdn.spimex.com/upload/reports/oil_xls/a.xls"
        );
    }

    #[test]
    fn empty_page_yields_nothing() {
        let outcome =
            ListingPageScanner::new("https://spimex.com", ymd(2023, 1, 1)).scan("<html></html>");
        assert_eq!(outcome, ScanOutcome::default());
    }
}
