//! Shared server state.
//!
//! One [`Session`] (dataset + [`Dashboard`]) sits behind an async `RwLock`.
//! Mutations re-derive a [`DashboardView`] and publish it to every
//! subscriber of the event channel.

use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use super::types::{DashboardResponse, TableResponse, UploadResponse};
use crate::models::RawRow;
use crate::session::{Command, Dashboard, DashboardView, FilterOptions};
use crate::transform::filter::{filter_rows, TableQuery};
use crate::transform::normalizer::NormalizeReport;
use crate::transform::pipeline::{CsvInfo, Dataset};

/// Dataset plus dashboard state for the connected users.
#[derive(Debug)]
pub struct Session {
    pub id: Uuid,
    pub dashboard: Dashboard,
    pub rows: Vec<RawRow>,
    pub headers: Vec<String>,
    pub csv_info: CsvInfo,
    pub report: NormalizeReport,
}

impl Session {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            id: Uuid::new_v4(),
            dashboard: Dashboard::new(dataset.records),
            rows: dataset.rows,
            headers: dataset.headers,
            csv_info: dataset.csv_info,
            report: dataset.report,
        }
    }

    /// Swap in a new dataset. The selection survives; the id changes.
    pub fn replace(&mut self, dataset: Dataset) {
        self.id = Uuid::new_v4();
        self.dashboard.replace_records(dataset.records);
        self.rows = dataset.rows;
        self.headers = dataset.headers;
        self.csv_info = dataset.csv_info;
        self.report = dataset.report;
    }
}

/// Handle shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    session: Arc<RwLock<Session>>,
    events: broadcast::Sender<DashboardView>,
}

impl AppState {
    pub fn new(dataset: Dataset, event_capacity: usize) -> Self {
        let (events, _) = broadcast::channel(event_capacity.max(1));
        Self {
            session: Arc::new(RwLock::new(Session::new(dataset))),
            events,
        }
    }

    pub async fn dashboard(&self) -> DashboardResponse {
        let session = self.session.read().await;
        DashboardResponse {
            session_id: session.id.to_string(),
            view: session.dashboard.view(),
        }
    }

    pub async fn options(&self) -> FilterOptions {
        self.session.read().await.dashboard.options()
    }

    /// Apply a command and publish the resulting view.
    pub async fn apply(&self, command: Command) -> DashboardResponse {
        let mut session = self.session.write().await;
        session.dashboard.apply(command);
        let view = session.dashboard.view();
        self.publish(&view);

        DashboardResponse {
            session_id: session.id.to_string(),
            view,
        }
    }

    /// Replace the dataset and publish the resulting view.
    pub async fn replace_dataset(&self, dataset: Dataset) -> UploadResponse {
        let mut session = self.session.write().await;
        session.replace(dataset);
        let view = session.dashboard.view();
        self.publish(&view);

        UploadResponse::new(
            session.id.to_string(),
            session.csv_info.clone(),
            session.report.clone(),
            view,
        )
    }

    pub async fn table(&self, query: &TableQuery) -> TableResponse {
        let session = self.session.read().await;
        TableResponse {
            headers: session.headers.clone(),
            total_rows: session.rows.len(),
            rows: filter_rows(&session.rows, query),
        }
    }

    /// Receiver of every view published after a mutation.
    pub fn subscribe(&self) -> broadcast::Receiver<DashboardView> {
        self.events.subscribe()
    }

    fn publish(&self, view: &DashboardView) {
        // No subscribers is fine
        let _ = self.events.send(view.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Highlight;
    use crate::transform::pipeline::{load_bytes, LoadOptions};

    const SAMPLE: &str = "year,stock,region,category,value,unit\n\
                          2016,Cod,North,Demersal,5,kt\n\
                          2016,Haddock,South,Demersal,3,kt\n\
                          2017,Herring,North,Pelagic,2,kt\n";

    fn state() -> AppState {
        let dataset = load_bytes(SAMPLE.as_bytes(), &LoadOptions::default()).unwrap();
        AppState::new(dataset, 8)
    }

    #[tokio::test]
    async fn test_apply_publishes_view() {
        let state = state();
        let mut rx = state.subscribe();

        let response = state.apply(Command::SelectRegion("North".into())).await;
        assert_eq!(response.view.filtered_records, 2);

        let published = rx.recv().await.unwrap();
        assert_eq!(published, response.view);
    }

    #[tokio::test]
    async fn test_highlight_then_read() {
        let state = state();
        state.apply(Command::SetHighlight(Highlight::Year(2016))).await;

        let current = state.dashboard().await;
        let highlighted = current.view.highlighted.unwrap();
        assert_eq!(highlighted.regional[0].highlighted_value, 5.0);
    }

    #[tokio::test]
    async fn test_replace_dataset_changes_session() {
        let state = state();
        let before = state.dashboard().await.session_id;
        state.apply(Command::SelectYear(2020)).await;

        let csv = "year,stock,region,category,value,unit\n2020,Crab,East,Shellfish,abc,t\n";
        let dataset = load_bytes(csv.as_bytes(), &LoadOptions::default()).unwrap();
        let response = state.replace_dataset(dataset).await;

        assert_ne!(response.session_id, before);
        assert_eq!(response.status, "warning");
        assert_eq!(response.view.selection.year, Some(2020));
        assert_eq!(response.view.filtered_records, 1);
    }

    #[tokio::test]
    async fn test_table_query() {
        let state = state();
        let query = TableQuery::new().with_column("region", "nor");

        let table = state.table(&query).await;
        assert_eq!(table.total_rows, 3);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.headers.len(), 6);
    }

    #[tokio::test]
    async fn test_options() {
        let options = state().options().await;
        assert_eq!(options.years, vec![2016, 2017]);
        assert_eq!(options.categories, vec!["Demersal", "Pelagic"]);
    }
}
