use super::*;

use smartgrid_core::{EditorKind, GridError, GridResult, OptionItem, ValidationErrors, Value};

use crate::edit::{CellAddress, CellEdit, apply_edit, apply_nested_edit};
use crate::form::{FormMode, FormPanel, FormSubmission};
use crate::options::{FetchOutcome, submit_new_option};

impl SmartGrid {
    /// Column descriptor behind a cell, top-level or nested
    fn column_for(&self, address: &CellAddress) -> GridResult<&ColumnDescriptor> {
        let column = match &address.nested {
            None => self.column(&address.column),
            Some(nested) => {
                let config = self
                    .sub_rows
                    .as_ref()
                    .filter(|c| c.key == nested.section)
                    .ok_or_else(|| {
                        GridError::NotFound(format!("nested section '{}'", nested.section))
                    })?;
                config.column(&address.column)
            }
        };
        column.ok_or_else(|| GridError::NotFound(format!("column '{}'", address.column)))
    }

    /// The row a cell lives in: the dataset row or its nested child
    fn row_for(&self, address: &CellAddress) -> GridResult<&Row> {
        let row = self
            .row(&address.row)
            .ok_or_else(|| GridError::NotFound(format!("row '{}'", address.row)))?;
        let Some(nested) = &address.nested else {
            return Ok(row);
        };
        let config = self
            .sub_rows
            .as_ref()
            .ok_or_else(|| GridError::NotFound(format!("nested section '{}'", nested.section)))?;
        config
            .child_index(row, &nested.child)
            .and_then(|i| row.nested(&config.key).and_then(|children| children.get(i)))
            .ok_or_else(|| GridError::NotFound(format!("nested row '{}'", nested.child)))
    }

    fn option_key(address: &CellAddress) -> String {
        match &address.nested {
            Some(nested) => format!("{}.{}", nested.section, address.column),
            None => address.column.clone(),
        }
    }

    /// Open the editor of a cell. Read-only columns are rejected.
    pub fn begin_edit(&mut self, address: CellAddress) -> GridResult<EditorKind> {
        let column = self.column_for(&address)?.clone();
        let current = self.row_for(&address)?.value(&address.column).clone();
        let editor = self.cell_edit.begin(address, &column, &current)?;
        tracing::debug!(column = %column.key, editor = ?editor, "Editing cell");
        Ok(editor)
    }

    pub fn set_edit_draft(&mut self, value: Value) -> GridResult<()> {
        self.cell_edit.set_draft(value)
    }

    pub fn cancel_edit(&mut self) {
        if let Some(edit) = self.cell_edit.cancel() {
            tracing::debug!(column = %edit.address.column, "Edit cancelled");
        }
    }

    pub fn editing(&self) -> Option<&CellEdit> {
        self.cell_edit.editing()
    }

    /// Write the pending edit into the row and hand it to the mutation handler.
    ///
    /// The row is restored when validation or the handler fails. After an
    /// invalid value the cell stays in edit mode so the draft can be fixed.
    /// Returns the dependent fields that were cleared.
    #[tracing::instrument(skip(self), fields(grid_id = %self.config.grid_id))]
    pub async fn commit_edit(&mut self) -> GridResult<Vec<String>> {
        self.gate.try_begin(GridAction::CommitCell)?;
        let result = self.commit_pending_edit().await;
        self.gate.finish(GridAction::CommitCell);
        result
    }

    async fn commit_pending_edit(&mut self) -> GridResult<Vec<String>> {
        // The editor stays open until the value is accepted
        let edit = self
            .cell_edit
            .editing()
            .cloned()
            .ok_or_else(|| GridError::NotFound("no cell is being edited".into()))?;
        if edit.draft == edit.original {
            self.cell_edit.finish();
            return Ok(Vec::new());
        }
        let address = edit.address;
        let index = self
            .index_of(&address.row)
            .ok_or_else(|| GridError::NotFound(format!("row '{}'", address.row)))?;
        let snapshot = self.rows[index].clone();

        let (cleared, rejected) = match &address.nested {
            None => {
                let cleared =
                    apply_edit(&mut self.rows[index], &self.columns, &address.column, edit.draft)?;
                let rejected = self
                    .validator
                    .validate_field(&address.column, &self.rows[index]);
                (cleared, rejected)
            }
            Some(nested) => {
                let config = self.sub_rows.as_ref().ok_or_else(|| {
                    GridError::NotFound(format!("nested section '{}'", nested.section))
                })?;
                let cleared = apply_nested_edit(
                    &mut self.rows[index],
                    config,
                    &nested.child,
                    &address.column,
                    edit.draft,
                )?;
                let rejected = config
                    .child_index(&self.rows[index], &nested.child)
                    .and_then(|i| self.rows[index].nested(&config.key)?.get(i))
                    .and_then(|child| config.validate_field(&address.column, child));
                (cleared, rejected)
            }
        };

        if let Some(message) = rejected {
            tracing::debug!(row = %address.row, column = %address.column, "Edit failed validation");
            self.rows[index] = snapshot;
            let mut errors = ValidationErrors::new();
            errors.insert(address.column.clone(), message);
            return Err(GridError::Validation(errors));
        }
        self.cell_edit.finish();

        for field in &cleared {
            let key = Self::option_key(&CellAddress {
                column: field.clone(),
                ..address.clone()
            });
            if let Some(loader) = self.cell_loaders.get_mut(&key) {
                loader.reset();
            }
        }

        if let Some(handler) = self.mutation_handler.clone() {
            let row = self.rows[index].clone();
            if let Err(err) = handler.on_edit_row(&address.row, &row).await {
                tracing::error!(row = %address.row, column = %address.column, "Edit rejected: {}", err);
                self.rows[index] = snapshot;
                self.notices
                    .push(Notice::error(format!("Could not save the change: {}", err)));
                self.recompute();
                return Err(GridError::Mutation(err.to_string()));
            }
        }

        tracing::info!(row = %address.row, column = %address.column, cleared = cleared.len(), "Cell committed");
        self.events.push(GridEvent::RowEdited(address.row));
        self.recompute();
        Ok(cleared)
    }

    // Cell options

    /// Search the lazy options of a cell, scoped by the row it lives in
    pub async fn search_cell_options(
        &mut self,
        address: &CellAddress,
        term: &str,
    ) -> GridResult<FetchOutcome> {
        let source = self
            .column_for(address)?
            .option_source
            .clone()
            .ok_or_else(|| GridError::NotFound(format!("lazy options for '{}'", address.column)))?;
        let context = self.row_for(address)?.clone();
        let key = Self::option_key(address);
        let page_size = self.config.option_page_size;

        let loader = self
            .cell_loaders
            .entry(key.clone())
            .or_insert_with(|| LazyOptionLoader::new(source, page_size));
        let outcome = loader.search(term, Some(context)).await;
        self.report_fetch(&key, &outcome);
        Ok(outcome)
    }

    pub async fn load_more_cell_options(
        &mut self,
        address: &CellAddress,
    ) -> GridResult<Option<FetchOutcome>> {
        let key = Self::option_key(address);
        let loader = self
            .cell_loaders
            .get_mut(&key)
            .ok_or_else(|| GridError::NotFound(format!("lazy options for '{}'", key)))?;
        let outcome = loader.load_more().await;
        if let Some(outcome) = &outcome {
            self.report_fetch(&key, outcome);
        }
        Ok(outcome)
    }

    /// Options currently offered by a cell's editor
    pub fn cell_options(&self, address: &CellAddress) -> &[OptionItem] {
        let Ok(column) = self.column_for(address) else {
            return &[];
        };
        if column.option_source.is_none() {
            return &column.options;
        }
        self.cell_loaders
            .get(&Self::option_key(address))
            .map(|l| l.options())
            .unwrap_or(&[])
    }

    /// Create an option from typed text. When the cell is being edited the
    /// new option is selected.
    pub async fn add_option(&mut self, address: &CellAddress, text: &str) -> GridResult<OptionItem> {
        self.gate.try_begin(GridAction::AddOption)?;
        let result = self.add_cell_option(address, text).await;
        self.gate.finish(GridAction::AddOption);
        result
    }

    async fn add_cell_option(&mut self, address: &CellAddress, text: &str) -> GridResult<OptionItem> {
        let column = self.column_for(address)?;
        let handler = column.add_new.clone().ok_or_else(|| {
            GridError::InvalidValue(format!("'{}' does not accept new options", column.key))
        })?;

        let item = match submit_new_option(handler.as_ref(), &address.column, text).await {
            Ok(item) => item,
            Err(err) => {
                self.notices
                    .push(Notice::error(format!("Could not add option: {}", err)));
                return Err(err);
            }
        };
        if let Some(loader) = self.cell_loaders.get_mut(&Self::option_key(address)) {
            loader.insert_option(item.clone());
        }
        if self.cell_edit.is_editing(address) {
            self.cell_edit.push_draft(item.value.clone())?;
        }
        Ok(item)
    }

    // Rows

    /// Validate and append a row. It is shown at once and removed again if
    /// the mutation handler rejects it.
    #[tracing::instrument(skip(self, row), fields(grid_id = %self.config.grid_id))]
    pub async fn add_row(&mut self, row: Row) -> GridResult<RowId> {
        self.gate.try_begin(GridAction::AddRow)?;
        let result = self.insert_row(row).await;
        self.gate.finish(GridAction::AddRow);
        result
    }

    async fn insert_row(&mut self, mut row: Row) -> GridResult<RowId> {
        let errors = self.validator.validate(&row);
        if !errors.is_empty() {
            return Err(GridError::Validation(errors));
        }
        if let Some(config) = &self.sub_rows {
            config.recompute(&mut row);
        }

        let index = self.rows.len();
        self.rows.push(row.clone());
        self.rebuild_ids();
        self.recompute();

        if let Some(handler) = self.mutation_handler.clone() {
            match handler.on_add_row(&row).await {
                Ok(mut stored) => {
                    if let Some(config) = &self.sub_rows {
                        config.recompute(&mut stored);
                    }
                    self.rows[index] = stored;
                    self.rebuild_ids();
                }
                Err(err) => {
                    tracing::error!("Add row rejected: {}", err);
                    self.rows.remove(index);
                    self.rebuild_ids();
                    self.recompute();
                    self.notices
                        .push(Notice::error(format!("Could not add the row: {}", err)));
                    return Err(GridError::Mutation(err.to_string()));
                }
            }
        }

        let id = self.row_ids[index].clone();
        tracing::info!(row = %id, "Row added");
        self.events.push(GridEvent::RowAdded(id.clone()));
        self.recompute();
        Ok(id)
    }

    /// Remove a row. It is restored in place if the mutation handler fails.
    #[tracing::instrument(skip(self), fields(grid_id = %self.config.grid_id))]
    pub async fn delete_row(&mut self, id: &RowId) -> GridResult<()> {
        self.gate.try_begin(GridAction::DeleteRow)?;
        let result = self.remove_row(id).await;
        self.gate.finish(GridAction::DeleteRow);
        result
    }

    async fn remove_row(&mut self, id: &RowId) -> GridResult<()> {
        let index = self
            .index_of(id)
            .ok_or_else(|| GridError::NotFound(format!("row '{}'", id)))?;
        let removed = self.rows.remove(index);
        self.rebuild_ids();

        if let Some(handler) = self.mutation_handler.clone() {
            if let Err(err) = handler.on_delete_row(id, &removed).await {
                tracing::error!(row = %id, "Delete rejected: {}", err);
                self.rows.insert(index, removed);
                self.rebuild_ids();
                self.recompute();
                self.notices
                    .push(Notice::error(format!("Could not delete the row: {}", err)));
                return Err(GridError::Mutation(err.to_string()));
            }
        }

        if self.cell_edit.editing().is_some_and(|e| &e.address.row == id) {
            self.cell_edit.cancel();
        }
        self.prune_selection();
        tracing::info!(row = %id, "Row deleted");
        self.events.push(GridEvent::RowDeleted(id.clone()));
        self.recompute();
        Ok(())
    }

    // Forms

    pub fn open_add_form(&self) -> FormPanel {
        FormPanel::for_add(&self.columns, self.validator.clone(), self.config.option_page_size)
    }

    pub fn open_edit_form(&self, id: &RowId) -> GridResult<FormPanel> {
        let row = self
            .row(id)
            .cloned()
            .ok_or_else(|| GridError::NotFound(format!("row '{}'", id)))?;
        Ok(FormPanel::for_edit(
            id.clone(),
            row,
            &self.columns,
            self.validator.clone(),
            self.config.option_page_size,
        ))
    }

    /// Submit a form and apply the result to the dataset
    #[tracing::instrument(skip(self, form), fields(grid_id = %self.config.grid_id))]
    pub async fn submit_form(&mut self, form: &mut FormPanel) -> GridResult<RowId> {
        self.gate.try_begin(GridAction::SubmitForm)?;
        let result = self.submit_form_inner(form).await;
        self.gate.finish(GridAction::SubmitForm);
        result
    }

    async fn submit_form_inner(&mut self, form: &mut FormPanel) -> GridResult<RowId> {
        let submission = match self.mutation_handler.clone() {
            Some(handler) => match form.submit(handler.as_ref()).await {
                Ok(submission) => submission,
                Err(err) => {
                    if matches!(err, GridError::Mutation(_)) {
                        self.notices
                            .push(Notice::error(format!("Could not save the form: {}", err)));
                    }
                    return Err(err);
                }
            },
            None => {
                let row = form.begin_submit()?;
                form.finish_submit();
                match form.mode() {
                    FormMode::Add => FormSubmission::Added(row),
                    FormMode::Edit(id) => FormSubmission::Edited(id.clone(), row),
                }
            }
        };

        let id = match submission {
            FormSubmission::Added(mut row) => {
                if let Some(config) = &self.sub_rows {
                    config.recompute(&mut row);
                }
                self.rows.push(row);
                self.rebuild_ids();
                let id = self.row_ids[self.rows.len() - 1].clone();
                self.events.push(GridEvent::RowAdded(id.clone()));
                id
            }
            FormSubmission::Edited(id, mut row) => {
                let index = self
                    .index_of(&id)
                    .ok_or_else(|| GridError::NotFound(format!("row '{}'", id)))?;
                if let Some(config) = &self.sub_rows {
                    config.recompute(&mut row);
                }
                self.rows[index] = row;
                self.rebuild_ids();
                self.events.push(GridEvent::RowEdited(id.clone()));
                id
            }
        };
        self.recompute();
        Ok(id)
    }
}
