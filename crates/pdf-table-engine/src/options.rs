use std::collections::BTreeSet;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderMode {
    /// The first row of every region names the columns.
    #[default]
    HasHeader,
    /// Columns are named by position: `0`, `1`, ...
    NoHeader,
    AutoDetect,
}

impl FromStr for HeaderMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "has-header" | "header" => Ok(Self::HasHeader),
            "no-header" | "none" => Ok(Self::NoHeader),
            "auto" | "auto-detect" => Ok(Self::AutoDetect),
            other => Err(format!(
                "unknown header mode '{other}', expected has-header, no-header or auto"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSelection {
    pages: BTreeSet<u32>,
}

impl PageSelection {
    #[must_use]
    pub fn contains(&self, page: u32) -> bool {
        self.pages.contains(&page)
    }
}

impl FromStr for PageSelection {
    type Err = String;

    fn from_str(selection: &str) -> Result<Self, Self::Err> {
        let mut pages = BTreeSet::new();
        for token in selection.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if let Some((start, end)) = token.split_once('-') {
                let start: u32 = start
                    .trim()
                    .parse()
                    .map_err(|_| format!("invalid page range start: '{start}'"))?;
                let end: u32 = end
                    .trim()
                    .parse()
                    .map_err(|_| format!("invalid page range end: '{end}'"))?;
                if start == 0 || end == 0 {
                    return Err("pages are 1-based".to_string());
                }
                if end < start {
                    return Err(format!(
                        "invalid range '{token}': end is smaller than start"
                    ));
                }
                pages.extend(start..=end);
            } else {
                let page: u32 = token
                    .parse()
                    .map_err(|_| format!("invalid page number: '{token}'"))?;
                if page == 0 {
                    return Err("pages are 1-based".to_string());
                }
                pages.insert(page);
            }
        }

        if pages.is_empty() {
            return Err("page selection cannot be empty".to_string());
        }

        Ok(Self { pages })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractOptions {
    /// `None` scans every page.
    pub pages: Option<PageSelection>,
    pub header_mode: HeaderMode,
    /// Minimum cells a line needs to count as a table row.
    pub min_cols: usize,
    /// Spreadsheet delimiter.
    pub delimiter: u8,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            pages: None,
            header_mode: HeaderMode::HasHeader,
            min_cols: 2,
            delimiter: b',',
        }
    }
}
