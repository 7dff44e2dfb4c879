use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::catalog::{SelectedService, TenantId, VehicleClass};
use crate::domain::customer::CustomerId;
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Draft,
    Scheduled,
    Dispatched,
    InProgress,
    Completed,
    Cancelled,
}

impl JobStatus {
    /// Terminal states freeze the job's price breakdown; the CRUD layer must
    /// refuse further edits once a job lands here.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JobVehicle {
    pub class: VehicleClass,
    pub plate: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TowJob {
    pub id: JobId,
    pub tenant_id: TenantId,
    pub status: JobStatus,
    pub customer_id: Option<CustomerId>,
    pub vehicles: Vec<JobVehicle>,
    pub pickup_address: String,
    pub dropoff_address: String,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: NaiveTime,
    pub is_holiday: bool,
    pub start_from_depot: bool,
    pub services: Vec<SelectedService>,
    pub created_at: DateTime<Utc>,
}

impl TowJob {
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self.status, next),
            (JobStatus::Draft, JobStatus::Scheduled)
                | (JobStatus::Scheduled, JobStatus::Dispatched)
                | (JobStatus::Dispatched, JobStatus::InProgress)
                | (JobStatus::InProgress, JobStatus::Completed)
                | (JobStatus::Draft, JobStatus::Cancelled)
                | (JobStatus::Scheduled, JobStatus::Cancelled)
                | (JobStatus::Dispatched, JobStatus::Cancelled)
                | (JobStatus::InProgress, JobStatus::Cancelled)
        )
    }

    pub fn transition_to(&mut self, next: JobStatus) -> Result<(), DomainError> {
        if self.can_transition_to(next) {
            self.status = next;
            return Ok(());
        }

        Err(DomainError::InvalidJobTransition { from: self.status, to: next })
    }

    /// Guard used before mutating the persisted breakdown in place.
    pub fn ensure_breakdown_editable(&self) -> Result<(), DomainError> {
        if self.status.is_terminal() {
            return Err(DomainError::FrozenBreakdown {
                job_id: self.id.0.clone(),
                status: self.status,
            });
        }
        Ok(())
    }

    pub fn vehicle_classes(&self) -> Vec<VehicleClass> {
        self.vehicles.iter().map(|vehicle| vehicle.class).collect()
    }
}
