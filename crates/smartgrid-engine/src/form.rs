//! Dynamic form panel
//!
//! Builds a field per editable column over a draft row. Field changes go
//! through the same normalization and dependency clearing as inline edits,
//! and submission is blocked while validation errors remain.

use indexmap::IndexMap;

use smartgrid_core::{
    ColumnDescriptor, EditorKind, GridError, GridResult, OptionItem, Row, RowId,
    RowMutationHandler, ValidationErrors, Value,
};

use crate::edit::{FormValidator, apply_edit};
use crate::options::{FetchOutcome, LazyOptionLoader, submit_new_option};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Add,
    Edit(RowId),
}

/// One input of the form
#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub key: String,
    pub label: String,
    pub editor: EditorKind,
    pub required: bool,
    pub max_length: Option<usize>,
    pub options: Vec<OptionItem>,
    pub allow_add_new: bool,
}

/// Result of a successful submission
#[derive(Debug, Clone, PartialEq)]
pub enum FormSubmission {
    /// The stored row returned by the handler
    Added(Row),
    Edited(RowId, Row),
}

pub struct FormPanel {
    mode: FormMode,
    columns: Vec<ColumnDescriptor>,
    draft: Row,
    errors: ValidationErrors,
    validator: FormValidator,
    loaders: IndexMap<String, LazyOptionLoader>,
    submitting: bool,
}

impl FormPanel {
    /// Empty form for a new row
    pub fn for_add(columns: &[ColumnDescriptor], validator: FormValidator, option_page_size: usize) -> Self {
        Self::new(FormMode::Add, columns, Row::new(), validator, option_page_size)
    }

    /// Form prefilled with an existing row
    pub fn for_edit(
        id: RowId,
        row: Row,
        columns: &[ColumnDescriptor],
        validator: FormValidator,
        option_page_size: usize,
    ) -> Self {
        Self::new(FormMode::Edit(id), columns, row, validator, option_page_size)
    }

    fn new(
        mode: FormMode,
        columns: &[ColumnDescriptor],
        draft: Row,
        validator: FormValidator,
        option_page_size: usize,
    ) -> Self {
        let columns: Vec<ColumnDescriptor> = columns.iter().filter(|c| c.editable).cloned().collect();
        let loaders = columns
            .iter()
            .filter_map(|c| {
                let source = c.option_source.clone()?;
                Some((c.key.clone(), LazyOptionLoader::new(source, option_page_size)))
            })
            .collect();
        Self {
            mode,
            columns,
            draft,
            errors: ValidationErrors::new(),
            validator,
            loaders,
            submitting: false,
        }
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn fields(&self) -> Vec<FormField> {
        self.columns
            .iter()
            .map(|c| FormField {
                key: c.key.clone(),
                label: c.label.clone(),
                editor: c.editor(),
                required: c.required,
                max_length: c.max_length,
                options: c.options.clone(),
                allow_add_new: c.add_new.is_some(),
            })
            .collect()
    }

    pub fn draft(&self) -> &Row {
        &self.draft
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    fn column(&self, key: &str) -> GridResult<&ColumnDescriptor> {
        self.columns
            .iter()
            .find(|c| c.key == key)
            .ok_or_else(|| GridError::NotFound(format!("form field '{}'", key)))
    }

    /// Set a field from raw input. Returns the dependent fields that were cleared.
    pub fn set_field(&mut self, key: &str, raw: Value) -> GridResult<Vec<String>> {
        self.column(key)?;
        let cleared = apply_edit(&mut self.draft, &self.columns, key, raw)?;
        for field in &cleared {
            if let Some(loader) = self.loaders.get_mut(field) {
                loader.reset();
            }
        }
        // Re-check only what changed
        let fresh = self.validator.validate(&self.draft);
        let mut errors = ValidationErrors::new();
        for (field, message) in self.errors.iter() {
            if field != key && !cleared.iter().any(|c| c == field) {
                errors.insert(field, message);
            }
        }
        if let Some(message) = fresh.get(key) {
            errors.insert(key, message);
        }
        self.errors = errors;
        Ok(cleared)
    }

    /// Run every rule. Returns true when the draft may be submitted.
    pub fn validate(&mut self) -> bool {
        self.errors = self.validator.validate(&self.draft);
        self.errors.is_empty()
    }

    /// Mark the form submitting and hand out the draft
    pub fn begin_submit(&mut self) -> GridResult<Row> {
        if self.submitting {
            return Err(GridError::Busy("submit form".into()));
        }
        if !self.validate() {
            tracing::debug!(errors = %self.errors, "Form submission blocked by validation");
            return Err(GridError::Validation(self.errors.clone()));
        }
        self.submitting = true;
        Ok(self.draft.clone())
    }

    pub fn finish_submit(&mut self) {
        self.submitting = false;
    }

    /// Validate and submit through the mutation handler
    pub async fn submit(&mut self, handler: &dyn RowMutationHandler) -> GridResult<FormSubmission> {
        let row = self.begin_submit()?;
        let result = match &self.mode {
            FormMode::Add => handler.on_add_row(&row).await.map(FormSubmission::Added),
            FormMode::Edit(id) => handler
                .on_edit_row(id, &row)
                .await
                .map(|()| FormSubmission::Edited(id.clone(), row)),
        };
        self.finish_submit();

        match result {
            Ok(submission) => {
                tracing::info!(mode = ?self.mode, "Form submitted");
                Ok(submission)
            }
            Err(err) => {
                tracing::error!(mode = ?self.mode, "Form submission failed: {}", err);
                Err(GridError::Mutation(err.to_string()))
            }
        }
    }

    /// Fetch the first page of options for a lazy field, scoped by the draft
    pub async fn search_options(&mut self, key: &str, term: &str) -> GridResult<FetchOutcome> {
        let row = self.draft.clone();
        let loader = self
            .loaders
            .get_mut(key)
            .ok_or_else(|| GridError::NotFound(format!("lazy options for '{}'", key)))?;
        Ok(loader.search(term, Some(row)).await)
    }

    pub async fn load_more_options(&mut self, key: &str) -> GridResult<Option<FetchOutcome>> {
        let loader = self
            .loaders
            .get_mut(key)
            .ok_or_else(|| GridError::NotFound(format!("lazy options for '{}'", key)))?;
        Ok(loader.load_more().await)
    }

    pub fn options(&self, key: &str) -> &[OptionItem] {
        self.loaders.get(key).map(|l| l.options()).unwrap_or(&[])
    }

    /// Create an option from typed text and select it
    pub async fn add_new_option(&mut self, key: &str, text: &str) -> GridResult<OptionItem> {
        let column = self.column(key)?;
        let handler = column
            .add_new
            .clone()
            .ok_or_else(|| GridError::InvalidValue(format!("'{}' does not accept new options", key)))?;
        let multi = column.kind.is_multi();

        let item = submit_new_option(handler.as_ref(), key, text).await?;
        if let Some(loader) = self.loaders.get_mut(key) {
            loader.insert_option(item.clone());
        }

        let value = if multi {
            let mut items = self.draft.value(key).as_array().map(<[Value]>::to_vec).unwrap_or_default();
            if !items.contains(&item.value) {
                items.push(item.value.clone());
            }
            Value::Array(items)
        } else {
            item.value.clone()
        };
        self.set_field(key, value)?;
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use smartgrid_core::{AddNewHandler, ColumnKind};
    use std::sync::Arc;

    #[derive(Default)]
    struct RecordingHandler {
        added: Mutex<Vec<Row>>,
        fail: bool,
    }

    #[async_trait]
    impl RowMutationHandler for RecordingHandler {
        async fn on_add_row(&self, row: &Row) -> GridResult<Row> {
            if self.fail {
                return Err(GridError::Other("rejected".into()));
            }
            self.added.lock().push(row.clone());
            Ok(row.clone().with("id", 42))
        }

        async fn on_edit_row(&self, _: &RowId, _: &Row) -> GridResult<()> {
            Ok(())
        }

        async fn on_delete_row(&self, _: &RowId, _: &Row) -> GridResult<()> {
            Ok(())
        }
    }

    struct Creator;

    #[async_trait]
    impl AddNewHandler for Creator {
        async fn on_add_new(&self, _: &str, value: &str) -> GridResult<OptionItem> {
            Ok(OptionItem::new(value, format!("new-{}", value.to_lowercase())))
        }
    }

    fn columns() -> Vec<ColumnDescriptor> {
        vec![
            ColumnDescriptor::new("driver", "Driver", ColumnKind::EditableText)
                .required()
                .with_max_length(10),
            ColumnDescriptor::integer("stops", "Stops").editable(true),
            ColumnDescriptor::new("tags", "Tags", ColumnKind::MultiSelect)
                .editable(true)
                .with_add_new(Arc::new(Creator)),
            ColumnDescriptor::text("internal", "Internal"),
        ]
    }

    fn form() -> FormPanel {
        let columns = columns();
        FormPanel::for_add(&columns, FormValidator::from_columns(&columns), 20)
    }

    #[test]
    fn test_fields_come_from_editable_columns() {
        let keys: Vec<String> = form().fields().into_iter().map(|f| f.key).collect();
        assert_eq!(keys, vec!["driver", "stops", "tags"]);
    }

    #[test]
    fn test_set_field_normalizes() {
        let mut form = form();
        form.set_field("stops", "12".into()).unwrap();
        assert_eq!(form.draft().value("stops"), &Value::Int(12));
        assert!(form.set_field("internal", "x".into()).is_err());
    }

    #[tokio::test]
    async fn test_validation_blocks_submit() {
        let mut form = form();
        let handler = RecordingHandler::default();
        let err = form.submit(&handler).await.unwrap_err();
        assert!(matches!(err, GridError::Validation(ref e) if e.contains("driver")));
        assert!(handler.added.lock().is_empty());

        form.set_field("driver", "Ann".into()).unwrap();
        assert!(form.errors().is_empty());
        let submitted = form.submit(&handler).await.unwrap();
        assert!(matches!(submitted, FormSubmission::Added(ref row) if row.value("id") == &Value::Int(42)));
    }

    #[test]
    fn test_duplicate_submit_is_busy() {
        let mut form = form();
        form.set_field("driver", "Ann".into()).unwrap();
        form.begin_submit().unwrap();
        assert!(matches!(form.begin_submit(), Err(GridError::Busy(_))));
        form.finish_submit();
        assert!(form.begin_submit().is_ok());
    }

    #[tokio::test]
    async fn test_handler_failure_is_mutation_error() {
        let mut form = form();
        form.set_field("driver", "Ann".into()).unwrap();
        let handler = RecordingHandler {
            fail: true,
            ..RecordingHandler::default()
        };
        assert!(matches!(form.submit(&handler).await, Err(GridError::Mutation(_))));
        assert!(!form.is_submitting());
    }

    #[tokio::test]
    async fn test_add_new_option_selects_it() {
        let mut form = form();
        form.set_field("tags", Value::Array(vec!["old".into()])).unwrap();
        let item = form.add_new_option("tags", "Fragile").await.unwrap();
        assert_eq!(item.value, Value::from("new-fragile"));
        assert_eq!(
            form.draft().value("tags"),
            &Value::Array(vec!["old".into(), "new-fragile".into()])
        );

        assert!(matches!(
            form.add_new_option("stops", "x").await,
            Err(GridError::InvalidValue(_))
        ));
    }
}
