//! The wizard controller: one instance per active referral session.
//!
//! The controller owns the record, the current position in the path's step
//! table and the current error map, and applies guarded transitions:
//!
//! - `advance` is permitted only when the current step validates clean;
//!   answering "no" to the imaging gate routes to a terminal [`WizardState::Blocked`]
//!   display state instead, because every later step assumes imaging data.
//! - `retreat` is unconditional; at the first step (or from `Blocked`) it
//!   exits the wizard, discarding the record.
//! - submission happens in two halves, `begin_submit` / `finish_submit`,
//!   so the controller stays synchronous while the caller awaits the
//!   notification sink. The `Submitting` state between the two halves
//!   refuses edits and duplicate submissions, which guarantees at most one
//!   in-flight delivery per record.
//!
//! The controller never performs I/O; rendering and delivery belong to the
//! `mailer` crate.

use referral_types::ReferralPath;

use crate::steps::{steps_for, StepDescriptor, StepKind};
use crate::validation::{validate_record, validate_step, FieldErrors, ValidationRules};
use crate::{ReferralError, ReferralRecord, ReferralResult};

/// Where a wizard session currently stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WizardState {
    /// On step `i` (1-based).
    Step(usize),
    /// Imaging was answered "no"; only retreat/exit is possible.
    Blocked,
    /// A delivery attempt is in flight; edits and transitions are refused.
    Submitting,
    /// Delivery succeeded; waiting for the confirmation to be dismissed.
    Submitted,
}

/// Outcome of an advance attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Advance {
    /// Moved to (or stayed capped at) the given step.
    Moved(usize),
    /// The current step has validation errors; see [`Wizard::errors`].
    Rejected,
    /// Routed to the blocked display state.
    Blocked,
}

/// Outcome of a retreat.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Retreat {
    Moved(usize),
    /// Left the wizard entirely; the record has been discarded.
    Exited,
}

/// State container for one in-progress referral.
pub struct Wizard {
    record: ReferralRecord,
    state: WizardState,
    errors: FieldErrors,
    delivery_error: Option<String>,
    rules: ValidationRules,
}

impl Wizard {
    /// Start a fresh wizard on step 1 with an empty record.
    pub fn new(path: ReferralPath, rules: ValidationRules) -> Self {
        Self {
            record: ReferralRecord::new(path),
            state: WizardState::Step(1),
            errors: FieldErrors::new(),
            delivery_error: None,
            rules,
        }
    }

    pub fn path(&self) -> ReferralPath {
        self.record.path
    }

    pub fn state(&self) -> WizardState {
        self.state
    }

    pub fn record(&self) -> &ReferralRecord {
        &self.record
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Reason the last delivery attempt failed, until the next attempt.
    pub fn delivery_error(&self) -> Option<&str> {
        self.delivery_error.as_deref()
    }

    pub fn step_count(&self) -> usize {
        self.steps().len()
    }

    /// Current step index (1-based). `None` in `Blocked` and `Submitted`;
    /// during `Submitting` the session is still logically on the last step.
    pub fn current_step(&self) -> Option<usize> {
        match self.state {
            WizardState::Step(i) => Some(i),
            WizardState::Submitting => Some(self.step_count()),
            WizardState::Blocked | WizardState::Submitted => None,
        }
    }

    pub fn step_label(&self) -> Option<&'static str> {
        self.current_step().map(|i| self.steps()[i - 1].label)
    }

    fn steps(&self) -> &'static [StepDescriptor] {
        steps_for(self.record.path)
    }

    fn reset(&mut self) {
        self.record = ReferralRecord::new(self.record.path);
        self.errors.clear();
        self.delivery_error = None;
        self.state = WizardState::Step(1);
    }

    /// Replace the record with an edited copy.
    ///
    /// Field errors recorded by a previous advance attempt are cleared; the
    /// next transition revalidates from scratch.
    ///
    /// # Errors
    ///
    /// - [`ReferralError::RecordLocked`] outside the `Step` state,
    /// - [`ReferralError::PathMismatch`] when the edit changes the path,
    /// - attachment errors when an attachment fails verification.
    pub fn update_record(&mut self, record: ReferralRecord) -> ReferralResult<()> {
        if !matches!(self.state, WizardState::Step(_)) {
            return Err(ReferralError::RecordLocked);
        }
        if record.path != self.record.path {
            return Err(ReferralError::PathMismatch);
        }
        record.verify_attachments()?;
        self.record = record;
        self.errors.clear();
        Ok(())
    }

    /// Try to leave the current step forwards.
    ///
    /// # Errors
    ///
    /// [`ReferralError::TransitionUnavailable`] outside the `Step` state.
    pub fn advance(&mut self) -> ReferralResult<Advance> {
        let current = match self.state {
            WizardState::Step(i) => i,
            _ => return Err(ReferralError::TransitionUnavailable),
        };
        let step = &self.steps()[current - 1];

        self.errors = validate_step(&self.record, step.kind, self.rules);
        if !self.errors.is_empty() {
            return Ok(Advance::Rejected);
        }

        if step.kind == StepKind::Reason && self.record.has_imaging.is_no() {
            self.state = WizardState::Blocked;
            return Ok(Advance::Blocked);
        }

        let next = (current + 1..=self.step_count())
            .find(|&i| !self.steps()[i - 1].is_skipped(&self.record));
        let target = next.unwrap_or(current);
        self.state = WizardState::Step(target);
        Ok(Advance::Moved(target))
    }

    /// Move backwards, exiting the wizard from the first step or from the
    /// blocked state. On exit the record is discarded.
    ///
    /// # Errors
    ///
    /// [`ReferralError::TransitionUnavailable`] while submitting or after
    /// submission.
    pub fn retreat(&mut self) -> ReferralResult<Retreat> {
        match self.state {
            WizardState::Blocked => {
                self.reset();
                Ok(Retreat::Exited)
            }
            WizardState::Step(current) => {
                let previous = (1..current)
                    .rev()
                    .find(|&i| !self.steps()[i - 1].is_skipped(&self.record));
                match previous {
                    Some(target) => {
                        self.state = WizardState::Step(target);
                        Ok(Retreat::Moved(target))
                    }
                    None => {
                        self.reset();
                        Ok(Retreat::Exited)
                    }
                }
            }
            WizardState::Submitting | WizardState::Submitted => {
                Err(ReferralError::TransitionUnavailable)
            }
        }
    }

    /// Begin a submission: gate on completeness, enter `Submitting` and hand
    /// the caller a snapshot of the record to render and deliver.
    ///
    /// # Errors
    ///
    /// - [`ReferralError::AlreadySubmitting`] while a delivery is in flight,
    /// - [`ReferralError::NotOnFinalStep`] from any earlier step,
    /// - [`ReferralError::ImagingRequired`] when imaging is answered "no";
    ///   the wizard routes to `Blocked`, the same terminal the reason step
    ///   leads to,
    /// - [`ReferralError::IncompleteRecord`] when the record fails the full
    ///   validation gate (the error map is retained on the wizard),
    /// - [`ReferralError::TransitionUnavailable`] from `Blocked`/`Submitted`.
    pub fn begin_submit(&mut self) -> ReferralResult<ReferralRecord> {
        match self.state {
            WizardState::Submitting => return Err(ReferralError::AlreadySubmitting),
            WizardState::Step(i) if i == self.step_count() => {}
            WizardState::Step(_) => return Err(ReferralError::NotOnFinalStep),
            WizardState::Blocked | WizardState::Submitted => {
                return Err(ReferralError::TransitionUnavailable)
            }
        }

        // The imaging gate holds at submission too. The reason step blocks
        // the normal flow, but a record edited to "no" on a later step would
        // otherwise slip past validation because the imaging step is skipped.
        if self.record.has_imaging.is_no() {
            self.state = WizardState::Blocked;
            return Err(ReferralError::ImagingRequired);
        }

        self.errors = validate_record(&self.record, self.rules);
        if !self.errors.is_empty() {
            return Err(ReferralError::IncompleteRecord);
        }

        self.delivery_error = None;
        self.state = WizardState::Submitting;
        Ok(self.record.clone())
    }

    /// Record the delivery outcome for the in-flight submission.
    ///
    /// Success moves to `Submitted`. Failure returns to the last step with
    /// the reason retained; the record is untouched, so the user can retry
    /// without re-entering anything.
    ///
    /// # Errors
    ///
    /// [`ReferralError::NotSubmitting`] when no submission is in flight.
    pub fn finish_submit(&mut self, outcome: Result<(), String>) -> ReferralResult<()> {
        if self.state != WizardState::Submitting {
            return Err(ReferralError::NotSubmitting);
        }
        match outcome {
            Ok(()) => {
                self.delivery_error = None;
                self.state = WizardState::Submitted;
            }
            Err(reason) => {
                self.delivery_error = Some(reason);
                self.state = WizardState::Step(self.step_count());
            }
        }
        Ok(())
    }

    /// Dismiss the success confirmation: discard the record and return to
    /// step 1 so a new referral can start.
    ///
    /// # Errors
    ///
    /// [`ReferralError::NotSubmitted`] outside the `Submitted` state.
    pub fn dismiss(&mut self) -> ReferralResult<()> {
        if self.state != WizardState::Submitted {
            return Err(ReferralError::NotSubmitted);
        }
        self.reset();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::complete_record;
    use referral_types::TriState;

    fn wizard_with_complete_record() -> Wizard {
        let mut wizard = Wizard::new(ReferralPath::NewPatient, ValidationRules::default());
        wizard
            .update_record(complete_record(ReferralPath::NewPatient))
            .expect("record accepted");
        wizard
    }

    fn walk_to_last_step(wizard: &mut Wizard) {
        while wizard.current_step() != Some(wizard.step_count()) {
            match wizard.advance().expect("advance available") {
                Advance::Moved(_) => {}
                other => panic!("unexpected advance outcome: {other:?}"),
            }
        }
    }

    #[test]
    fn starts_on_step_one_with_empty_record() {
        let wizard = Wizard::new(ReferralPath::NewPatient, ValidationRules::default());
        assert_eq!(wizard.state(), WizardState::Step(1));
        assert_eq!(wizard.current_step(), Some(1));
        assert_eq!(wizard.step_label(), Some("Suspicion"));
        assert!(wizard.record().reason.is_empty());
    }

    #[test]
    fn advance_is_rejected_until_the_step_is_valid() {
        let mut wizard = Wizard::new(ReferralPath::NewPatient, ValidationRules::default());
        assert_eq!(wizard.advance().unwrap(), Advance::Rejected);
        assert!(wizard.errors().contains_key("reason"));
        assert_eq!(wizard.state(), WizardState::Step(1));

        let mut record = ReferralRecord::new(ReferralPath::NewPatient);
        record.reason = "Painless growing lump".into();
        record.has_imaging = TriState::Yes;
        wizard.update_record(record).unwrap();
        assert!(wizard.errors().is_empty(), "stale errors cleared on edit");
        assert_eq!(wizard.advance().unwrap(), Advance::Moved(2));
    }

    #[test]
    fn answering_no_to_imaging_blocks() {
        let mut wizard = Wizard::new(ReferralPath::Consultation, ValidationRules::default());
        let mut record = ReferralRecord::new(ReferralPath::Consultation);
        record.reason = "Second opinion requested".into();
        record.has_imaging = TriState::No;
        wizard.update_record(record).unwrap();

        assert_eq!(wizard.advance().unwrap(), Advance::Blocked);
        assert_eq!(wizard.state(), WizardState::Blocked);
        assert_eq!(wizard.current_step(), None);

        // Only retreat is possible from here.
        assert!(matches!(
            wizard.advance(),
            Err(ReferralError::TransitionUnavailable)
        ));
        assert!(matches!(
            wizard.update_record(ReferralRecord::new(ReferralPath::Consultation)),
            Err(ReferralError::RecordLocked)
        ));
    }

    #[test]
    fn retreat_from_blocked_exits_and_discards() {
        let mut wizard = Wizard::new(ReferralPath::NewPatient, ValidationRules::default());
        let mut record = ReferralRecord::new(ReferralPath::NewPatient);
        record.reason = "lump".into();
        record.has_imaging = TriState::No;
        wizard.update_record(record).unwrap();
        assert_eq!(wizard.advance().unwrap(), Advance::Blocked);

        assert_eq!(wizard.retreat().unwrap(), Retreat::Exited);
        assert_eq!(wizard.state(), WizardState::Step(1));
        assert!(wizard.record().reason.is_empty(), "record discarded");
    }

    #[test]
    fn retreat_from_first_step_exits() {
        let mut wizard = wizard_with_complete_record();
        assert_eq!(wizard.retreat().unwrap(), Retreat::Exited);
        assert!(wizard.record().reason.is_empty());
    }

    #[test]
    fn walks_the_whole_path_and_caps_at_the_end() {
        let mut wizard = wizard_with_complete_record();
        walk_to_last_step(&mut wizard);
        assert_eq!(wizard.current_step(), Some(6));
        assert_eq!(wizard.step_label(), Some("Contact"));

        // Advancing from the last step stays capped there.
        assert_eq!(wizard.advance().unwrap(), Advance::Moved(6));
        assert_eq!(wizard.retreat().unwrap(), Retreat::Moved(5));
    }

    #[test]
    fn retreat_skips_the_imaging_step_when_imaging_was_denied() {
        let mut wizard = wizard_with_complete_record();
        walk_to_last_step(&mut wizard);
        wizard.retreat().unwrap(); // 5
        wizard.retreat().unwrap(); // 4
        assert_eq!(wizard.retreat().unwrap(), Retreat::Moved(3));

        // The answer changes after the imaging step was passed; walking
        // backwards now skips straight to the reason step.
        let mut record = wizard.record().clone();
        record.has_imaging = TriState::No;
        record.selected_imaging.clear();
        record.imaging_exams.clear();
        wizard.update_record(record).unwrap();
        assert_eq!(wizard.retreat().unwrap(), Retreat::Moved(1));
    }

    #[test]
    fn imaging_denied_on_the_final_step_cannot_be_submitted() {
        let mut wizard = wizard_with_complete_record();
        walk_to_last_step(&mut wizard);

        // The answer flips to "no" after the imaging step was passed; the
        // record is otherwise complete and its imaging step is now skipped.
        let mut record = wizard.record().clone();
        record.has_imaging = TriState::No;
        record.selected_imaging.clear();
        record.imaging_exams.clear();
        wizard.update_record(record).unwrap();

        assert!(matches!(
            wizard.begin_submit(),
            Err(ReferralError::ImagingRequired)
        ));
        assert_eq!(wizard.state(), WizardState::Blocked);

        // The blocked terminal behaves as usual: retreat exits and discards.
        assert_eq!(wizard.retreat().unwrap(), Retreat::Exited);
        assert!(wizard.record().reason.is_empty());
    }

    #[test]
    fn begin_submit_requires_the_final_step() {
        let mut wizard = wizard_with_complete_record();
        assert!(matches!(
            wizard.begin_submit(),
            Err(ReferralError::NotOnFinalStep)
        ));
    }

    #[test]
    fn begin_submit_gates_on_completeness() {
        let mut wizard = Wizard::new(ReferralPath::NewPatient, ValidationRules::default());
        let mut record = complete_record(ReferralPath::NewPatient);
        record.patient.email = "broken".into();
        wizard.update_record(record).unwrap();
        walk_to_last_step(&mut wizard);

        // The contact step itself refuses to validate, so force the check
        // through begin_submit by fixing nothing.
        assert!(matches!(
            wizard.begin_submit(),
            Err(ReferralError::IncompleteRecord)
        ));
        assert!(wizard.errors().contains_key("patient_email"));
        assert_eq!(wizard.state(), WizardState::Step(6));
    }

    #[test]
    fn successful_submission_reaches_submitted_and_dismiss_resets() {
        let mut wizard = wizard_with_complete_record();
        walk_to_last_step(&mut wizard);

        let snapshot = wizard.begin_submit().expect("complete record");
        assert_eq!(snapshot.patient.first_name, "Petr");
        assert_eq!(wizard.state(), WizardState::Submitting);

        // Duplicate submission while in flight is refused.
        assert!(matches!(
            wizard.begin_submit(),
            Err(ReferralError::AlreadySubmitting)
        ));
        assert!(matches!(
            wizard.update_record(snapshot.clone()),
            Err(ReferralError::RecordLocked)
        ));

        wizard.finish_submit(Ok(())).unwrap();
        assert_eq!(wizard.state(), WizardState::Submitted);
        assert!(wizard.delivery_error().is_none());

        wizard.dismiss().unwrap();
        assert_eq!(wizard.state(), WizardState::Step(1));
        assert!(wizard.record().reason.is_empty());
    }

    #[test]
    fn failed_delivery_keeps_the_record_and_allows_retry() {
        let mut wizard = wizard_with_complete_record();
        walk_to_last_step(&mut wizard);
        let before = wizard.record().clone();

        wizard.begin_submit().unwrap();
        wizard
            .finish_submit(Err("delivery API returned 500".into()))
            .unwrap();

        assert_eq!(wizard.state(), WizardState::Step(6));
        assert_eq!(wizard.delivery_error(), Some("delivery API returned 500"));
        assert_eq!(wizard.record(), &before, "record unchanged after failure");

        // Manual retry with the same data succeeds.
        wizard.begin_submit().unwrap();
        wizard.finish_submit(Ok(())).unwrap();
        assert_eq!(wizard.state(), WizardState::Submitted);
    }

    #[test]
    fn finish_and_dismiss_guard_their_states() {
        let mut wizard = wizard_with_complete_record();
        assert!(matches!(
            wizard.finish_submit(Ok(())),
            Err(ReferralError::NotSubmitting)
        ));
        assert!(matches!(wizard.dismiss(), Err(ReferralError::NotSubmitted)));
    }

    #[test]
    fn update_record_refuses_a_path_change() {
        let mut wizard = Wizard::new(ReferralPath::NewPatient, ValidationRules::default());
        let record = ReferralRecord::new(ReferralPath::Consultation);
        assert!(matches!(
            wizard.update_record(record),
            Err(ReferralError::PathMismatch)
        ));
    }
}
