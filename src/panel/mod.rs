//! One controller per entity panel.
//!
//! A panel owns its cached rows and the referenced rows it needs for labels.
//! After every mutation it re-lists its table and dependencies from the
//! store; a `PanelWatcher` does the same when another writer changes them.

pub mod entity;
pub mod view;

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::error::{PanelError, StoreError, ValidationError};
use crate::models::{Course, CourseType, Offering, OfferingRecord};
use crate::resolve::Lookups;
use crate::store::{self, EntityStore, Table, Watch};

pub use entity::PanelEntity;
pub use view::{Notice, NoticeKind, PanelView, SelectOption, SelectOptions};

pub type SharedPanel<E> = Arc<Mutex<Panel<E>>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PanelMode<D> {
    Viewing,
    Editing { id: i64, draft: D },
}

pub struct Panel<E: PanelEntity> {
    store: Arc<dyn EntityStore>,
    rows: Vec<E>,
    lookups: Lookups,
    form: E::Draft,
    mode: PanelMode<E::Draft>,
    notice: Option<Notice>,
}

impl<E: PanelEntity> Panel<E> {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self {
            store,
            rows: Vec::new(),
            lookups: Lookups::default(),
            form: E::Draft::default(),
            mode: PanelMode::Viewing,
            notice: None,
        }
    }

    /// Creates the panel and loads its rows. A failed first load leaves the
    /// panel empty with a notice instead of failing the mount.
    pub async fn mount(store: Arc<dyn EntityStore>) -> Self {
        let mut panel = Self::new(store);
        panel.reload().await;
        info!("mounted {} panel with {} rows", E::TITLE, panel.rows.len());
        panel
    }

    pub fn shared(self) -> SharedPanel<E> {
        Arc::new(Mutex::new(self))
    }

    /// Tables whose changes make this panel's cache stale.
    pub fn watches() -> Vec<Watch> {
        std::iter::once(E::TABLE)
            .chain(E::DEPENDENCIES.iter().copied())
            .map(Watch::all)
            .collect()
    }

    pub fn rows(&self) -> &[E] {
        &self.rows
    }

    pub fn form(&self) -> &E::Draft {
        &self.form
    }

    pub fn mode(&self) -> &PanelMode<E::Draft> {
        &self.mode
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Re-lists this panel's table and its dependencies. The cache is only
    /// replaced when every list succeeded.
    pub async fn refresh(&mut self) -> Result<(), StoreError> {
        let records: Vec<E::Record> = store::list(self.store.as_ref(), E::TABLE).await?;
        let lookups = load_lookups(self.store.as_ref(), E::DEPENDENCIES).await?;

        self.rows = records.into_iter().map(E::from_record).collect();
        self.lookups = lookups;
        Ok(())
    }

    /// `refresh` for callers that only need the failure reported.
    pub async fn reload(&mut self) {
        if let Err(err) = self.refresh().await {
            error!("failed to refresh {} panel: {}", E::TITLE, err);
            self.notice = Some(Notice::new(NoticeKind::Store, err.to_string()));
        }
    }

    pub fn set_form(&mut self, form: E::Draft) {
        self.form = form;
    }

    /// Inserts the add form. On failure the form is kept for a retry.
    pub async fn add(&mut self) -> Result<E, PanelError> {
        let fields = E::validate(&self.form, &self.lookups);
        let fields = self.report(fields.map_err(PanelError::from))?;

        let created = insert_row::<E>(self.store.as_ref(), &fields).await;
        let created = self.report(created)?;

        info!("added row {} to {}", created.id(), E::TABLE);
        self.form = E::Draft::default();
        self.notice = None;
        self.reload().await;
        Ok(created)
    }

    /// Starts editing a listed row, loading its fields into the draft.
    pub fn edit(&mut self, id: i64) -> Result<(), PanelError> {
        let draft = match self.rows.iter().find(|row| row.id() == id) {
            Some(row) => row.draft(),
            None => return self.report(Err(ValidationError::UnknownRow(id).into())),
        };
        self.mode = PanelMode::Editing { id, draft };
        self.notice = None;
        Ok(())
    }

    pub fn set_draft(&mut self, draft: E::Draft) -> Result<(), PanelError> {
        match &mut self.mode {
            PanelMode::Editing { draft: current, .. } => {
                *current = draft;
                Ok(())
            }
            PanelMode::Viewing => self.report(Err(ValidationError::NotEditing.into())),
        }
    }

    /// Leaves editing mode, dropping the draft and any notice it raised.
    pub fn cancel(&mut self) {
        self.mode = PanelMode::Viewing;
        self.notice = None;
    }

    /// Writes the draft back. On failure the panel stays in editing mode.
    pub async fn save(&mut self) -> Result<E, PanelError> {
        let (id, fields) = match &self.mode {
            PanelMode::Editing { id, draft } => (*id, E::validate(draft, &self.lookups)),
            PanelMode::Viewing => return self.report(Err(ValidationError::NotEditing.into())),
        };
        let fields = self.report(fields.map_err(PanelError::from))?;

        let updated = update_row::<E>(self.store.as_ref(), id, &fields).await;
        let updated = self.report(updated)?;

        info!("updated row {} in {}", id, E::TABLE);
        self.mode = PanelMode::Viewing;
        self.notice = None;
        self.reload().await;
        Ok(updated)
    }

    /// Deletes a row and refreshes whether or not the store accepted it.
    /// Rows in other tables that reference it are left alone.
    pub async fn delete(&mut self, id: i64) -> Result<(), PanelError> {
        let result = self.store.delete(E::TABLE, id).await;

        if matches!(self.mode, PanelMode::Editing { id: editing, .. } if editing == id) {
            self.mode = PanelMode::Viewing;
        }
        self.reload().await;

        match result {
            Ok(()) => {
                info!("deleted row {} from {}", id, E::TABLE);
                Ok(())
            }
            Err(err) => self.report(Err(err.into())),
        }
    }

    pub fn view(&self) -> PanelView<E::Row, E::Draft> {
        PanelView {
            title: E::TITLE,
            rows: self.rows.iter().map(|row| row.display(&self.lookups)).collect(),
            form: self.form.clone(),
            mode: self.mode.clone(),
            options: E::options(&self.lookups),
            can_submit: E::can_submit(&self.lookups),
            notice: self.notice.clone(),
        }
    }

    /// Records a failed action as the panel's notice.
    fn report<T>(&mut self, result: Result<T, PanelError>) -> Result<T, PanelError> {
        if let Err(err) = &result {
            let kind = match err {
                PanelError::Validation(e) => {
                    warn!("{} panel: {}", E::TITLE, e);
                    NoticeKind::Validation
                }
                PanelError::Store(e) => {
                    error!("{} panel: {}", E::TITLE, e);
                    NoticeKind::Store
                }
            };
            self.notice = Some(Notice::new(kind, err.to_string()));
        }
        result
    }
}

async fn insert_row<E: PanelEntity>(
    store: &dyn EntityStore,
    fields: &E::Fields,
) -> Result<E, PanelError> {
    let row = store.insert(E::TABLE, store::encode(E::TABLE, fields)?).await?;
    let record: E::Record = store::decode(E::TABLE, row)?;
    Ok(E::from_record(record))
}

async fn update_row<E: PanelEntity>(
    store: &dyn EntityStore,
    id: i64,
    fields: &E::Fields,
) -> Result<E, PanelError> {
    let row = store
        .update(E::TABLE, id, store::encode(E::TABLE, fields)?)
        .await?;
    let record: E::Record = store::decode(E::TABLE, row)?;
    Ok(E::from_record(record))
}

async fn load_lookups(store: &dyn EntityStore, tables: &[Table]) -> Result<Lookups, StoreError> {
    let mut lookups = Lookups::default();
    for table in tables {
        match table {
            Table::CourseTypes => lookups.course_types = store::list::<CourseType>(store, *table).await?,
            Table::Courses => lookups.courses = store::list::<Course>(store, *table).await?,
            Table::Offerings => {
                lookups.offerings = store::list::<OfferingRecord>(store, *table)
                    .await?
                    .into_iter()
                    .map(Offering::from)
                    .collect();
            }
            Table::Registrations => {}
        }
    }
    Ok(lookups)
}
