// ABOUTME: Training plan templates, plan assignments, and the assignment progress model
// ABOUTME: Owns workout completion bookkeeping, completion percentage, and status transitions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::HashSet;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::plans::MAX_DURATION_WEEKS;
use crate::errors::{AppError, AppResult, FieldErrors};

/// Difficulty of a training plan
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlanDifficulty {
    /// First 5k/10k plans
    Beginner,
    /// Half marathon and regular racing
    Intermediate,
    /// Marathon and beyond
    Advanced,
}

impl PlanDifficulty {
    /// Database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }
}

impl FromStr for PlanDifficulty {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            _ => Err(AppError::invalid_input(format!(
                "Invalid plan difficulty: {s}"
            ))),
        }
    }
}

/// Kind of a planned workout
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum WorkoutKind {
    /// Conversational pace
    #[default]
    EasyRun,
    /// Weekly long run
    LongRun,
    /// Sustained threshold effort
    Tempo,
    /// Repeats with recovery
    Intervals,
    /// Very easy shakeout
    Recovery,
    /// Non-running training
    CrossTraining,
    /// Planned rest day
    Rest,
    /// Race or time trial
    Race,
}

/// A single workout within a plan week
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlannedWorkout {
    /// Day label (e.g. "monday")
    #[serde(default)]
    pub day: Option<String>,
    /// Workout kind
    #[serde(default)]
    pub kind: WorkoutKind,
    /// Instructions shown to the runner
    pub description: String,
    /// Target distance
    #[serde(default)]
    pub distance_km: Option<f64>,
    /// Target duration
    #[serde(default)]
    pub duration_minutes: Option<u32>,
}

/// One week of a plan
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanWeek {
    /// 1-based week number
    pub week: u32,
    /// Theme of the week
    #[serde(default)]
    pub focus: Option<String>,
    /// Workouts in order; their position is the workout index
    #[serde(default)]
    pub workouts: Vec<PlannedWorkout>,
}

/// The JSON weekly structure stored with every plan
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct WeeklyStructure {
    /// Weeks in ascending order
    pub weeks: Vec<PlanWeek>,
}

impl WeeklyStructure {
    /// Total number of workouts across all weeks
    #[must_use]
    pub fn total_workouts(&self) -> usize {
        self.weeks.iter().map(|w| w.workouts.len()).sum()
    }

    /// Look up a week by number
    #[must_use]
    pub fn week(&self, week: u32) -> Option<&PlanWeek> {
        self.weeks.iter().find(|w| w.week == week)
    }

    /// Look up a workout by week number and index
    #[must_use]
    pub fn workout(&self, week: u32, index: u32) -> Option<&PlannedWorkout> {
        let index = usize::try_from(index).ok()?;
        self.week(week).and_then(|w| w.workouts.get(index))
    }

    /// Record structural problems into `errors` under the `weekly_structure` field
    pub fn validate(&self, duration_weeks: u32, errors: &mut FieldErrors) {
        const FIELD: &str = "weekly_structure";
        if self.weeks.is_empty() {
            errors.add(FIELD, "Plan must contain at least one week");
            return;
        }
        let mut seen = HashSet::new();
        for week in &self.weeks {
            if week.week == 0 || week.week > duration_weeks {
                errors.add(
                    FIELD,
                    format!("Week {} is outside 1..={duration_weeks}", week.week),
                );
            }
            if !seen.insert(week.week) {
                errors.add(FIELD, format!("Week {} appears more than once", week.week));
            }
            if week.workouts.iter().any(|w| w.description.trim().is_empty()) {
                errors.add(
                    FIELD,
                    format!("Week {} has a workout without a description", week.week),
                );
            }
            if week
                .workouts
                .iter()
                .any(|w| w.distance_km.is_some_and(|d| !(0.0..=1000.0).contains(&d)))
            {
                errors.add(
                    FIELD,
                    format!("Week {} has an invalid workout distance", week.week),
                );
            }
        }
    }
}

/// Validate the declared plan length
pub fn validate_duration_weeks(duration_weeks: u32, errors: &mut FieldErrors) {
    errors.require(
        (1..=MAX_DURATION_WEEKS).contains(&duration_weeks),
        "duration_weeks",
        format!("Duration must be between 1 and {MAX_DURATION_WEEKS} weeks"),
    );
}

/// Plan template authored by a trainer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingPlan {
    /// Unique identifier
    pub id: Uuid,
    /// Authoring trainer
    pub trainer_id: Uuid,
    /// Title
    pub title: String,
    /// Description
    pub description: Option<String>,
    /// Difficulty
    pub difficulty: PlanDifficulty,
    /// Length in weeks
    pub duration_weeks: u32,
    /// Week-by-week workouts
    pub weekly_structure: WeeklyStructure,
    /// Visible to and enrollable by every runner
    pub is_public: bool,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification
    pub updated_at: DateTime<Utc>,
}

/// Lifecycle state of a plan assignment
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    /// Runner is working through the plan
    #[default]
    Active,
    /// Temporarily on hold
    Paused,
    /// All workouts done or closed out
    Completed,
    /// Given up
    Abandoned,
}

impl AssignmentStatus {
    /// Database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Abandoned => "abandoned",
        }
    }

    /// Completed and abandoned assignments never change again
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Abandoned)
    }

    /// Whether `self -> target` is an allowed transition
    #[must_use]
    pub const fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Active, Self::Paused | Self::Completed | Self::Abandoned)
                | (Self::Paused, Self::Active | Self::Abandoned)
        )
    }
}

impl Display for AssignmentStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssignmentStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "paused" => Ok(Self::Paused),
            "completed" => Ok(Self::Completed),
            "abandoned" => Ok(Self::Abandoned),
            _ => Err(AppError::invalid_input(format!(
                "Invalid assignment status: {s}"
            ))),
        }
    }
}

/// Operator-triggered status change
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentAction {
    /// active -> paused
    Pause,
    /// paused -> active
    Resume,
    /// active|paused -> abandoned
    Abandon,
    /// active -> completed
    Complete,
}

impl AssignmentAction {
    /// Status the action moves to
    #[must_use]
    pub const fn target_status(&self) -> AssignmentStatus {
        match self {
            Self::Pause => AssignmentStatus::Paused,
            Self::Resume => AssignmentStatus::Active,
            Self::Abandon => AssignmentStatus::Abandoned,
            Self::Complete => AssignmentStatus::Completed,
        }
    }
}

/// A completed (week, index) workout reference
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompletedWorkout {
    /// Week number
    pub week: u32,
    /// Workout index within the week
    pub index: u32,
    /// When the runner marked it done
    pub completed_at: DateTime<Utc>,
}

/// A runner's enrollment in a plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanAssignment {
    /// Unique identifier
    pub id: Uuid,
    /// Plan template
    pub plan_id: Uuid,
    /// Enrolled runner
    pub runner_id: Uuid,
    /// Trainer who assigned it, or the runner for self-enrollment
    pub assigned_by: Uuid,
    /// Lifecycle state
    pub status: AssignmentStatus,
    /// Day week 1 begins
    pub start_date: NaiveDate,
    /// Completed workout references
    pub completed_workouts: Vec<CompletedWorkout>,
    /// completed / total * 100, two decimals
    pub completion_percentage: f64,
    /// Enrollment time
    pub started_at: DateTime<Utc>,
    /// Set while paused
    pub paused_at: Option<DateTime<Utc>>,
    /// Set on completion
    pub completed_at: Option<DateTime<Utc>>,
    /// Last modification
    pub updated_at: DateTime<Utc>,
}

impl PlanAssignment {
    /// Create a fresh active assignment
    #[must_use]
    pub fn new(plan_id: Uuid, runner_id: Uuid, assigned_by: Uuid, start_date: NaiveDate) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            plan_id,
            runner_id,
            assigned_by,
            status: AssignmentStatus::Active,
            start_date,
            completed_workouts: Vec::new(),
            completion_percentage: 0.0,
            started_at: now,
            paused_at: None,
            completed_at: None,
            updated_at: now,
        }
    }

    /// Whether the (week, index) workout is done
    #[must_use]
    pub fn is_workout_completed(&self, week: u32, index: u32) -> bool {
        self.completed_workouts
            .iter()
            .any(|c| c.week == week && c.index == index)
    }

    /// Mark a workout done and recompute progress
    ///
    /// Returns `false` when the workout was already complete. Reaching 100%
    /// completes the assignment.
    ///
    /// # Errors
    ///
    /// Returns an error if the assignment is not active or the workout does
    /// not exist in `structure`
    pub fn complete_workout(
        &mut self,
        structure: &WeeklyStructure,
        week: u32,
        index: u32,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        self.ensure_active()?;
        if structure.workout(week, index).is_none() {
            return Err(AppError::not_found(format!(
                "Workout {index} in week {week}"
            )));
        }
        if self.is_workout_completed(week, index) {
            return Ok(false);
        }
        self.completed_workouts.push(CompletedWorkout {
            week,
            index,
            completed_at: now,
        });
        self.recompute(structure, now);
        Ok(true)
    }

    /// Remove a workout completion and recompute progress
    ///
    /// # Errors
    ///
    /// Returns an error if the assignment is not active
    pub fn uncomplete_workout(
        &mut self,
        structure: &WeeklyStructure,
        week: u32,
        index: u32,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        self.ensure_active()?;
        let before = self.completed_workouts.len();
        self.completed_workouts
            .retain(|c| !(c.week == week && c.index == index));
        if self.completed_workouts.len() == before {
            return Ok(false);
        }
        self.recompute(structure, now);
        Ok(true)
    }

    /// Apply an operator-triggered status change
    ///
    /// # Errors
    ///
    /// Returns `INVALID_STATE` when the transition is not allowed
    pub fn apply(&mut self, action: AssignmentAction, now: DateTime<Utc>) -> AppResult<()> {
        let target = action.target_status();
        if !self.status.can_transition_to(target) {
            return Err(AppError::invalid_state(format!(
                "Cannot move assignment from {} to {target}",
                self.status
            )));
        }
        self.status = target;
        match target {
            AssignmentStatus::Paused => self.paused_at = Some(now),
            AssignmentStatus::Active => self.paused_at = None,
            AssignmentStatus::Completed => {
                self.paused_at = None;
                self.completed_at = Some(now);
            }
            AssignmentStatus::Abandoned => {}
        }
        self.updated_at = now;
        Ok(())
    }

    fn ensure_active(&self) -> AppResult<()> {
        if self.status == AssignmentStatus::Active {
            Ok(())
        } else {
            Err(AppError::invalid_state(format!(
                "Workouts can only be updated on active assignments (status: {})",
                self.status
            )))
        }
    }

    fn recompute(&mut self, structure: &WeeklyStructure, now: DateTime<Utc>) {
        // Drop references the plan no longer has (plan edited after enrollment)
        self.completed_workouts
            .retain(|c| structure.workout(c.week, c.index).is_some());
        self.completion_percentage =
            completion_percentage(self.completed_workouts.len(), structure.total_workouts());
        self.updated_at = now;
        if self.completion_percentage >= 100.0 {
            self.status = AssignmentStatus::Completed;
            self.paused_at = None;
            self.completed_at = Some(now);
        }
    }

    /// Re-align progress after the plan's structure was edited
    ///
    /// Completions of workouts the plan no longer has are dropped and the
    /// percentage is recomputed against the new total. An open assignment
    /// that lands on 100 completes. Completed and abandoned assignments are
    /// left untouched. Returns whether anything changed.
    pub fn resync(&mut self, structure: &WeeklyStructure, now: DateTime<Utc>) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        let before = (self.completed_workouts.len(), self.completion_percentage, self.status);
        let updated_at = self.updated_at;
        self.recompute(structure, now);

        let changed = before.0 != self.completed_workouts.len()
            || (before.1 - self.completion_percentage).abs() > f64::EPSILON
            || before.2 != self.status;
        if !changed {
            self.updated_at = updated_at;
        }
        changed
    }
}

/// `completed / total * 100`, rounded to two decimals and capped at 100
#[must_use]
pub fn completion_percentage(completed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = completed as f64 / total as f64 * 100.0;
    ((raw * 100.0).round() / 100.0).min(100.0)
}

/// Completion of a single plan week
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WeekProgress {
    /// Week number
    pub week: u32,
    /// Completed workouts in the week
    pub completed: usize,
    /// Workouts in the week
    pub total: usize,
}

/// First workout not yet completed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NextWorkout {
    /// Week number
    pub week: u32,
    /// Index within the week
    pub index: u32,
    /// The workout itself
    pub workout: PlannedWorkout,
}

/// Progress view of an assignment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssignmentProgress {
    /// Assignment
    pub assignment_id: Uuid,
    /// Lifecycle state
    pub status: AssignmentStatus,
    /// Workouts in the plan
    pub total_workouts: usize,
    /// Completed workouts
    pub completed_workouts: usize,
    /// Percentage complete
    pub completion_percentage: f64,
    /// Week the calendar says the runner is in
    pub current_week: u32,
    /// Per-week breakdown
    pub weeks: Vec<WeekProgress>,
    /// Next pending workout, if any
    pub next_workout: Option<NextWorkout>,
}

impl AssignmentProgress {
    /// Compute the progress of `assignment` against `plan` as of `today`
    #[must_use]
    pub fn compute(plan: &TrainingPlan, assignment: &PlanAssignment, today: NaiveDate) -> Self {
        let structure = &plan.weekly_structure;
        let weeks = structure
            .weeks
            .iter()
            .map(|week| WeekProgress {
                week: week.week,
                completed: (0..week.workouts.len())
                    .filter(|&i| {
                        u32::try_from(i)
                            .is_ok_and(|i| assignment.is_workout_completed(week.week, i))
                    })
                    .count(),
                total: week.workouts.len(),
            })
            .collect();

        let next_workout = structure.weeks.iter().find_map(|week| {
            week.workouts.iter().enumerate().find_map(|(i, workout)| {
                let index = u32::try_from(i).ok()?;
                (!assignment.is_workout_completed(week.week, index)).then(|| NextWorkout {
                    week: week.week,
                    index,
                    workout: workout.clone(),
                })
            })
        });

        Self {
            assignment_id: assignment.id,
            status: assignment.status,
            total_workouts: structure.total_workouts(),
            completed_workouts: assignment.completed_workouts.len(),
            completion_percentage: assignment.completion_percentage,
            current_week: current_week(assignment.start_date, today, plan.duration_weeks),
            weeks,
            next_workout,
        }
    }
}

/// Calendar week of the plan on `today`, clamped to `1..=duration_weeks`
#[must_use]
pub fn current_week(start_date: NaiveDate, today: NaiveDate, duration_weeks: u32) -> u32 {
    let days = (today - start_date).num_days().max(0);
    let week = u32::try_from(days / 7 + 1).unwrap_or(u32::MAX);
    week.clamp(1, duration_weeks.max(1))
}
