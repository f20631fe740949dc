//! Lazily-loaded option lists
//!
//! A search bumps the loader's generation. Each request carries the
//! generation it was issued under, and a response is only applied when that
//! generation is still the latest, so a slow earlier search can never
//! overwrite the results of a later one.

use std::sync::Arc;

use smartgrid_core::{
    AddNewHandler, GridError, GridResult, OptionItem, OptionQuery, OptionSource, Row,
};

pub const DEFAULT_OPTION_PAGE_SIZE: usize = 20;

/// A pending option fetch
#[derive(Debug, Clone, PartialEq)]
pub struct OptionRequest {
    pub generation: u64,
    pub query: OptionQuery,
}

/// What happened to a finished fetch
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Number of options appended
    Applied(usize),
    /// A newer search was issued; the response was dropped
    Stale,
    /// The source failed; treated as an empty page
    Failed(String),
}

pub struct LazyOptionLoader {
    source: Arc<dyn OptionSource>,
    page_size: usize,
    generation: u64,
    search_term: String,
    row: Option<Row>,
    options: Vec<OptionItem>,
    has_more: bool,
    loading: bool,
}

impl LazyOptionLoader {
    pub fn new(source: Arc<dyn OptionSource>, page_size: usize) -> Self {
        Self {
            source,
            page_size: page_size.max(1),
            generation: 0,
            search_term: String::new(),
            row: None,
            options: Vec::new(),
            has_more: true,
            loading: false,
        }
    }

    pub fn source(&self) -> Arc<dyn OptionSource> {
        self.source.clone()
    }

    pub fn options(&self) -> &[OptionItem] {
        &self.options
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Start a new search from offset 0. Earlier in-flight requests become stale.
    pub fn begin_search(&mut self, term: &str, row: Option<Row>) -> OptionRequest {
        self.generation += 1;
        self.search_term = term.trim().to_string();
        self.row = row;
        self.options.clear();
        self.has_more = true;
        self.loading = true;
        self.request(0)
    }

    /// Request the next page of the current search, if there is one
    pub fn begin_next_page(&mut self) -> Option<OptionRequest> {
        if self.loading || !self.has_more {
            return None;
        }
        self.loading = true;
        Some(self.request(self.options.len()))
    }

    fn request(&self, offset: usize) -> OptionRequest {
        let mut query = OptionQuery::new(self.search_term.clone(), offset, self.page_size);
        query.row = self.row.clone();
        OptionRequest {
            generation: self.generation,
            query,
        }
    }

    pub fn finish(
        &mut self,
        request: &OptionRequest,
        result: GridResult<Vec<OptionItem>>,
    ) -> FetchOutcome {
        if request.generation != self.generation {
            tracing::debug!(
                stale = request.generation,
                latest = self.generation,
                "Discarding stale option response"
            );
            return FetchOutcome::Stale;
        }
        self.loading = false;

        match result {
            Ok(page) => {
                let count = page.len();
                self.has_more = count >= request.query.limit;
                self.options.extend(page);
                FetchOutcome::Applied(count)
            }
            Err(err) => {
                tracing::warn!(
                    term = %request.query.search_term,
                    offset = request.query.offset,
                    "Option fetch failed: {}",
                    err
                );
                self.has_more = false;
                FetchOutcome::Failed(err.to_string())
            }
        }
    }

    /// Search and wait for the first page
    pub async fn search(&mut self, term: &str, row: Option<Row>) -> FetchOutcome {
        let request = self.begin_search(term, row);
        let result = self.source.fetch_options(&request.query).await;
        self.finish(&request, result)
    }

    /// Fetch and append the next page
    pub async fn load_more(&mut self) -> Option<FetchOutcome> {
        let request = self.begin_next_page()?;
        let result = self.source.fetch_options(&request.query).await;
        Some(self.finish(&request, result))
    }

    /// Put a freshly created option at the top of the list
    pub fn insert_option(&mut self, item: OptionItem) {
        self.options.retain(|o| o.value != item.value);
        self.options.insert(0, item);
    }

    pub fn reset(&mut self) {
        self.generation += 1;
        self.search_term.clear();
        self.row = None;
        self.options.clear();
        self.has_more = true;
        self.loading = false;
    }
}

/// Submit typed text to an add-new handler and return the created option
pub async fn submit_new_option(
    handler: &dyn AddNewHandler,
    column: &str,
    text: &str,
) -> GridResult<OptionItem> {
    let text = text.trim();
    if text.is_empty() {
        return Err(GridError::InvalidValue("new option cannot be empty".into()));
    }
    let item = handler.on_add_new(column, text).await?;
    tracing::info!(column, label = %item.label, "Added new option");
    Ok(item)
}
