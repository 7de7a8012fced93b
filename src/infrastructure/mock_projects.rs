// Mock project source - Static seed set behind simulated network latency
use crate::application::ports::ProjectSource;
use crate::domain::project::{Project, ProjectStatus};
use crate::error::DashboardError;
use crate::infrastructure::config::MockSettings;
use async_trait::async_trait;
use chrono::NaiveDate;
use rand::Rng;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct MockProjectSource {
    min_latency: Duration,
    max_latency: Duration,
    /// Chance in `[0, 1]` that a fetch reports the upstream as unavailable
    failure_rate: f64,
}

impl MockProjectSource {
    /// Latency is drawn uniformly from `[min_latency, max_latency)`.
    pub fn new(min_latency: Duration, max_latency: Duration) -> Self {
        Self {
            min_latency,
            max_latency,
            failure_rate: 0.0,
        }
    }

    pub fn with_failure_rate(mut self, rate: f64) -> Self {
        self.failure_rate = if rate.is_finite() { rate.clamp(0.0, 1.0) } else { 0.0 };
        self
    }

    pub fn from_settings(settings: &MockSettings) -> Self {
        Self::new(
            Duration::from_millis(settings.min_latency_ms),
            Duration::from_millis(settings.max_latency_ms),
        )
        .with_failure_rate(settings.failure_rate)
    }

    #[cfg(test)]
    pub fn instant() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    fn latency(&self) -> Duration {
        if self.max_latency <= self.min_latency {
            return self.min_latency;
        }
        rand::thread_rng().gen_range(self.min_latency..self.max_latency)
    }
}

#[async_trait]
impl ProjectSource for MockProjectSource {
    async fn fetch_projects(&self) -> Result<Vec<Project>, DashboardError> {
        let latency = self.latency();
        tracing::debug!(latency_ms = latency.as_millis() as u64, "Fetching mock projects");
        tokio::time::sleep(latency).await;

        if rand::thread_rng().gen_bool(self.failure_rate) {
            return Err(DashboardError::SourceUnavailable(
                "mock upstream did not respond".to_string(),
            ));
        }
        Ok(seed_projects())
    }
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

fn team(names: &[&str]) -> Option<Vec<String>> {
    Some(names.iter().map(|n| n.to_string()).collect())
}

pub fn seed_projects() -> Vec<Project> {
    vec![
        Project {
            id: "1".to_string(),
            name: "E-commerce Platform".to_string(),
            status: ProjectStatus::Active,
            progress: 75,
            tasks_completed: 45,
            tasks_total: 60,
            start_date: date(2024, 1, 15),
            end_date: date(2025, 3, 30),
            description: Some("Modern e-commerce platform with microservices architecture".to_string()),
            team: team(&["Alice", "Bob", "Charlie"]),
        },
        Project {
            id: "2".to_string(),
            name: "Mobile Banking App".to_string(),
            status: ProjectStatus::Active,
            progress: 60,
            tasks_completed: 80,
            tasks_total: 85,
            start_date: date(2024, 6, 1),
            end_date: date(2025, 9, 30),
            description: Some("Secure mobile banking application with biometric authentication".to_string()),
            team: team(&["David", "Eve", "Frank"]),
        },
        Project {
            id: "3".to_string(),
            name: "AI Analytics Dashboard".to_string(),
            status: ProjectStatus::Pending,
            progress: 30,
            tasks_completed: 15,
            tasks_total: 50,
            start_date: date(2024, 8, 1),
            end_date: date(2025, 12, 31),
            description: Some("AI-powered analytics dashboard for business intelligence".to_string()),
            team: team(&["Grace", "Henry"]),
        },
        Project {
            id: "4".to_string(),
            name: "CRM System".to_string(),
            status: ProjectStatus::Completed,
            progress: 100,
            tasks_completed: 120,
            tasks_total: 120,
            start_date: date(2023, 3, 1),
            end_date: date(2024, 10, 15),
            description: Some("Customer relationship management system".to_string()),
            team: team(&["Ivan", "Julia", "Kevin", "Laura"]),
        },
        Project {
            id: "5".to_string(),
            name: "IoT Smart Home".to_string(),
            status: ProjectStatus::Active,
            progress: 85,
            tasks_completed: 34,
            tasks_total: 40,
            start_date: date(2024, 4, 10),
            end_date: date(2025, 6, 20),
            description: Some("IoT platform for smart home automation".to_string()),
            team: team(&["Mike", "Nancy"]),
        },
        Project {
            id: "6".to_string(),
            name: "Blockchain Wallet".to_string(),
            status: ProjectStatus::OnHold,
            progress: 45,
            tasks_completed: 22,
            tasks_total: 48,
            start_date: date(2024, 7, 1),
            end_date: date(2025, 11, 30),
            description: Some("Secure cryptocurrency wallet with multi-chain support".to_string()),
            team: team(&["Oliver", "Penny", "Quinn"]),
        },
    ]
}
