//! Core domain logic for the study planner.
//!
//! This crate contains the fundamental types and logic for:
//! - Availability: carving blocked intervals out of a daily window
//! - Allocation: spreading a subject's remaining hours across days
//! - Packing: cutting free intervals into bounded study slots
//! - Generation: planning and saving several subjects through a gateway
//! - Calendar: merging stored schedules into one view

mod allocation;
pub mod availability;
pub mod calendar;
mod gateway;
mod generate;
mod packing;
mod plan;
mod retry;
pub mod types;

pub use allocation::{AllocationState, DayPlan, day_budget, plan_day_budgets};
pub use availability::{
    Availability, DayAvailability, DayWindow, FreeInterval, aggregate_availability,
    resolve_free_intervals,
};
pub use calendar::{CalendarDay, CalendarSlot, SlotOverlap, combine_schedules, find_overlaps};
pub use gateway::{GatewayError, LoadedSchedules, SaveRequest, ScheduleGateway, StoredSchedule};
pub use generate::{
    GenerateError, GenerateReport, GenerateRequest, SubjectOutcome, generate_schedules,
};
pub use packing::{SlotRules, pack_day};
pub use plan::{PlanError, PlannerConfig, plan_subject};
pub use retry::{RetryPolicy, SaveOutcome, save_with_retry};
pub use types::{
    ClockTime, DateRange, ScheduleDay, Slot, Subject, SubjectName, UnavailableInterval,
    ValidationError, valid_intervals,
};
