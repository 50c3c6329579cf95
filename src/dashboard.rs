use std::sync::{Arc, Mutex, PoisonError};

use tracing::info;

use crate::models::{Course, CourseType, Offering, Registration};
use crate::panel::{Panel, PanelEntity, SharedPanel};
use crate::store::EntityStore;
use crate::watcher::PanelWatcher;

/// The four panels of the admin page, mounted over one store.
///
/// Each panel keeps its own cache and listener; panels never write into
/// each other's state and may briefly disagree until their next refresh.
pub struct Dashboard {
    pub course_types: SharedPanel<CourseType>,
    pub courses: SharedPanel<Course>,
    pub offerings: SharedPanel<Offering>,
    pub registrations: SharedPanel<Registration>,
    watchers: Mutex<Vec<PanelWatcher>>,
}

impl Dashboard {
    pub async fn mount(store: Arc<dyn EntityStore>) -> Self {
        let mut watchers = Vec::with_capacity(4);

        let course_types = mount_panel::<CourseType>(&store, &mut watchers).await;
        let courses = mount_panel::<Course>(&store, &mut watchers).await;
        let offerings = mount_panel::<Offering>(&store, &mut watchers).await;
        let registrations = mount_panel::<Registration>(&store, &mut watchers).await;

        info!("dashboard mounted with {} watchers", watchers.len());
        Self {
            course_types,
            courses,
            offerings,
            registrations,
            watchers: Mutex::new(watchers),
        }
    }

    /// Stops every panel's change listener.
    pub fn unmount(&self) {
        let watchers: Vec<PanelWatcher> = self
            .watchers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        info!("unmounting {} panel watchers", watchers.len());
    }

    pub fn running_watchers(&self) -> usize {
        self.watchers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|w| w.is_running())
            .count()
    }
}

// Subscribes before the first load so no change between the two is missed.
async fn mount_panel<E: PanelEntity>(
    store: &Arc<dyn EntityStore>,
    watchers: &mut Vec<PanelWatcher>,
) -> SharedPanel<E> {
    let events = store.subscribe();
    let panel = Panel::<E>::mount(store.clone()).await.shared();
    watchers.push(PanelWatcher::spawn(panel.clone(), events));
    panel
}

/// Lets generic handlers find an entity's panel on the dashboard.
pub trait DashboardPanel: PanelEntity {
    fn panel(dashboard: &Dashboard) -> &SharedPanel<Self>;
}

impl DashboardPanel for CourseType {
    fn panel(dashboard: &Dashboard) -> &SharedPanel<Self> {
        &dashboard.course_types
    }
}

impl DashboardPanel for Course {
    fn panel(dashboard: &Dashboard) -> &SharedPanel<Self> {
        &dashboard.courses
    }
}

impl DashboardPanel for Offering {
    fn panel(dashboard: &Dashboard) -> &SharedPanel<Self> {
        &dashboard.offerings
    }
}

impl DashboardPanel for Registration {
    fn panel(dashboard: &Dashboard) -> &SharedPanel<Self> {
        &dashboard.registrations
    }
}
