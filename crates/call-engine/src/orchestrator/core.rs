//! Call routing state machine

use std::collections::HashMap;

use tracing::debug;

use crate::agent::{self, Operator, OperatorId, OperatorStatus};
use crate::error::{CallCenterError, Result};
use crate::protocol::Command;
use crate::queue::PendingQueue;

use super::types::{CallId, CallState, DispatcherStats, Notification};

/// # Call Dispatcher
///
/// Owns the fixed operator roster, the call-to-operator assignment map and the
/// pending queue. Every transition runs to completion, including any chained
/// re-allocation, and returns the outcome messages in emission order.
///
/// A transition that returns an error has not touched any state.
///
/// ```rust
/// use switchboard_call_engine::orchestrator::{CallId, Dispatcher};
///
/// let mut dispatcher = Dispatcher::new(1).unwrap();
/// let messages: Vec<String> = dispatcher
///     .receive_call(CallId(7))
///     .unwrap()
///     .iter()
///     .map(ToString::to_string)
///     .collect();
/// assert_eq!(messages, ["Call 7 received", "Call 7 ringing for operator A"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatcher {
    operators: Vec<Operator>,
    /// Calls that are ringing or active, mapped to their operator index
    assignment: HashMap<CallId, usize>,
    pending: PendingQueue,
}

impl Dispatcher {
    /// Create a dispatcher with `num_operators` available operators
    pub fn new(num_operators: usize) -> Result<Self> {
        Ok(Self {
            operators: agent::roster(num_operators)?,
            assignment: HashMap::new(),
            pending: PendingQueue::new(),
        })
    }

    /// Apply one decoded command
    pub fn handle(&mut self, command: &Command) -> Result<Vec<Notification>> {
        match *command {
            Command::Call(call) => self.receive_call(call),
            Command::Answer(operator) => self.answer_call(operator),
            Command::Reject(operator) => self.reject_call(operator),
            Command::Hangup(call) => self.hangup_call(call),
        }
    }

    /// A new call arrives
    pub fn receive_call(&mut self, call: CallId) -> Result<Vec<Notification>> {
        if let Some(state) = self.call_state(call) {
            return Err(CallCenterError::invalid_transition(format!(
                "call {} is already known ({:?})",
                call, state
            )));
        }

        let mut out = vec![Notification::Received(call)];
        if self.pending.is_empty() {
            self.allocate(call, &mut out);
        } else {
            // never overtake a waiting call
            self.enqueue(call, &mut out);
            if let Some(index) = self.free_operator(None) {
                if let Some(next) = self.pending.dequeue() {
                    out.push(self.ring(index, next));
                }
            }
        }
        self.debug_check();
        Ok(out)
    }

    /// The ringing operator picks up
    pub fn answer_call(&mut self, operator: OperatorId) -> Result<Vec<Notification>> {
        let (index, call) = self.ringing_operator(operator)?;
        self.operators[index].status = OperatorStatus::OnCall;
        debug!(%call, %operator, "call answered");

        self.debug_check();
        Ok(vec![Notification::Answered { call, operator }])
    }

    /// The ringing operator declines and the call is offered again
    ///
    /// Another free operator is preferred. Failing that, the call goes back to the
    /// same operator when other calls are waiting, or into the queue when none are.
    /// A call parked that way rings on the freed operator at the next arrival.
    pub fn reject_call(&mut self, operator: OperatorId) -> Result<Vec<Notification>> {
        let (index, call) = self.ringing_operator(operator)?;
        self.release(index, call);
        debug!(%call, %operator, "call rejected");

        let mut out = vec![Notification::Rejected { call, operator }];
        match self.free_operator(Some(index)) {
            Some(other) => out.push(self.ring(other, call)),
            None if !self.pending.is_empty() => out.push(self.ring(index, call)),
            None => self.enqueue(call, &mut out),
        }
        self.debug_check();
        Ok(out)
    }

    /// The caller hangs up, whatever state the call is in
    pub fn hangup_call(&mut self, call: CallId) -> Result<Vec<Notification>> {
        if self.pending.remove(call) {
            debug!(%call, "queued call abandoned");
            self.debug_check();
            return Ok(vec![Notification::Missed(call)]);
        }

        let index = *self.assignment.get(&call).ok_or_else(|| {
            CallCenterError::invalid_transition(format!("call {} is not known", call))
        })?;
        let operator = self.operators[index].id;
        let outcome = match self.operators[index].status {
            OperatorStatus::Ringing => Notification::Missed(call),
            OperatorStatus::OnCall => Notification::Finished { call, operator },
            OperatorStatus::Available => {
                return Err(CallCenterError::internal(format!(
                    "call {} is assigned to available operator {}",
                    call, operator
                )));
            }
        };
        self.release(index, call);
        debug!(%call, %operator, "call ended");

        let mut out = vec![outcome];
        if let Some(next) = self.pending.dequeue() {
            out.push(self.ring(index, next));
        }
        self.debug_check();
        Ok(out)
    }

    pub fn operator_count(&self) -> usize {
        self.operators.len()
    }

    /// Operators in roster order
    pub fn operators(&self) -> &[Operator] {
        &self.operators
    }

    pub fn operator(&self, id: OperatorId) -> Option<&Operator> {
        self.operators.get(self.operator_index(id).ok()?)
    }

    /// Queued calls, front first
    pub fn queued_calls(&self) -> Vec<CallId> {
        self.pending.iter().collect()
    }

    pub fn call_state(&self, call: CallId) -> Option<CallState> {
        if self.pending.contains(call) {
            return Some(CallState::Queued);
        }
        let operator = &self.operators[*self.assignment.get(&call)?];
        match operator.status {
            OperatorStatus::Ringing => Some(CallState::Ringing(operator.id)),
            OperatorStatus::OnCall => Some(CallState::Active(operator.id)),
            OperatorStatus::Available => None,
        }
    }

    pub fn stats(&self) -> DispatcherStats {
        let count = |status| self.operators.iter().filter(|op| op.status == status).count();
        DispatcherStats {
            total_operators: self.operators.len(),
            available: count(OperatorStatus::Available),
            ringing: count(OperatorStatus::Ringing),
            on_call: count(OperatorStatus::OnCall),
            queued_calls: self.pending.len(),
        }
    }

    /// Verify the roster, assignment map and queue agree with each other
    pub fn check_invariants(&self) -> Result<()> {
        for call in self.pending.iter() {
            if self.assignment.contains_key(&call) {
                return Err(CallCenterError::internal(format!(
                    "call {} is both queued and assigned",
                    call
                )));
            }
        }
        let mut seen = self.pending.iter().collect::<Vec<_>>();
        seen.sort();
        if seen.windows(2).any(|pair| pair[0] == pair[1]) {
            return Err(CallCenterError::internal("pending queue holds a duplicate call"));
        }

        for (&call, &index) in &self.assignment {
            let operator = self.operators.get(index).ok_or_else(|| {
                CallCenterError::internal(format!("call {} maps to missing slot {}", call, index))
            })?;
            if operator.current_call != Some(call) {
                return Err(CallCenterError::internal(format!(
                    "call {} maps to operator {} holding {:?}",
                    call, operator.id, operator.current_call
                )));
            }
        }

        for (index, operator) in self.operators.iter().enumerate() {
            if OperatorId::from_index(index) != Some(operator.id) {
                return Err(CallCenterError::internal(format!(
                    "slot {} is named {}",
                    index, operator.id
                )));
            }
            match (operator.status, operator.current_call) {
                (OperatorStatus::Available, None) => {}
                (OperatorStatus::Available, Some(call)) => {
                    return Err(CallCenterError::internal(format!(
                        "available operator {} still holds call {}",
                        operator.id, call
                    )));
                }
                (status, None) => {
                    return Err(CallCenterError::internal(format!(
                        "operator {} is {} without a call",
                        operator.id, status
                    )));
                }
                (_, Some(call)) => {
                    if self.assignment.get(&call) != Some(&index) {
                        return Err(CallCenterError::internal(format!(
                            "operator {} holds unmapped call {}",
                            operator.id, call
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Offer `call` to the lowest-index available operator, or queue it
    fn allocate(&mut self, call: CallId, out: &mut Vec<Notification>) {
        match self.free_operator(None) {
            Some(index) => out.push(self.ring(index, call)),
            None => self.enqueue(call, out),
        }
    }

    fn enqueue(&mut self, call: CallId, out: &mut Vec<Notification>) {
        self.pending.enqueue(call);
        debug!(%call, queued = self.pending.len(), "call waiting");
        out.push(Notification::Queued(call));
    }

    /// Lowest-index available operator, skipping slot `except`
    fn free_operator(&self, except: Option<usize>) -> Option<usize> {
        self.operators
            .iter()
            .enumerate()
            .position(|(i, op)| Some(i) != except && op.is_available())
    }

    fn ring(&mut self, index: usize, call: CallId) -> Notification {
        let operator = &mut self.operators[index];
        operator.status = OperatorStatus::Ringing;
        operator.current_call = Some(call);
        self.assignment.insert(call, index);
        debug!(%call, operator = %operator.id, "ringing");
        Notification::Ringing {
            call,
            operator: operator.id,
        }
    }

    fn release(&mut self, index: usize, call: CallId) {
        let operator = &mut self.operators[index];
        operator.status = OperatorStatus::Available;
        operator.current_call = None;
        self.assignment.remove(&call);
    }

    fn operator_index(&self, id: OperatorId) -> Result<usize> {
        let index = id.index();
        if index < self.operators.len() {
            Ok(index)
        } else {
            Err(CallCenterError::unknown_operator(format!(
                "{} (roster is {} operators)",
                id,
                self.operators.len()
            )))
        }
    }

    fn ringing_operator(&self, id: OperatorId) -> Result<(usize, CallId)> {
        let index = self.operator_index(id)?;
        let operator = &self.operators[index];
        match (operator.status, operator.current_call) {
            (OperatorStatus::Ringing, Some(call)) => Ok((index, call)),
            (status, _) => Err(CallCenterError::invalid_transition(format!(
                "operator {} is {}, not ringing",
                id, status
            ))),
        }
    }

    fn debug_check(&self) {
        debug_assert!(
            self.check_invariants().is_ok(),
            "dispatcher invariant broken: {:?}",
            self.check_invariants()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(c: char) -> OperatorId {
        c.to_string().parse().unwrap()
    }

    fn texts(result: Result<Vec<Notification>>) -> Vec<String> {
        result.unwrap().iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_new_dispatcher_is_idle() {
        for n in 1..=26 {
            let dispatcher = Dispatcher::new(n).unwrap();
            let stats = dispatcher.stats();
            assert_eq!(stats.total_operators, n);
            assert_eq!(stats.available, n);
            assert_eq!(stats.queued_calls, 0);
            assert!(dispatcher.assignment.is_empty());
            dispatcher.check_invariants().unwrap();
        }
        assert!(Dispatcher::new(0).is_err());
        assert!(Dispatcher::new(27).is_err());
    }

    #[test]
    fn test_allocation_prefers_lowest_index() {
        let mut d = Dispatcher::new(3).unwrap();
        d.receive_call(CallId(1)).unwrap();
        d.receive_call(CallId(2)).unwrap();
        d.receive_call(CallId(3)).unwrap();
        // free B, then the next call must land on B rather than waiting
        d.hangup_call(CallId(2)).unwrap();
        assert_eq!(
            texts(d.receive_call(CallId(4))),
            ["Call 4 received", "Call 4 ringing for operator B"]
        );
    }

    #[test]
    fn test_two_operator_scenario() {
        let mut d = Dispatcher::new(2).unwrap();
        assert_eq!(texts(d.receive_call(CallId(1))), ["Call 1 received", "Call 1 ringing for operator A"]);
        assert_eq!(texts(d.receive_call(CallId(2))), ["Call 2 received", "Call 2 ringing for operator B"]);
        assert_eq!(texts(d.receive_call(CallId(3))), ["Call 3 received", "Call 3 waiting in queue"]);
        assert_eq!(texts(d.hangup_call(CallId(1))), ["Call 1 missed", "Call 3 ringing for operator A"]);
        assert!(d.queued_calls().is_empty());
        assert_eq!(d.call_state(CallId(3)), Some(CallState::Ringing(op('A'))));
    }

    #[test]
    fn test_answer_then_finish() {
        let mut d = Dispatcher::new(2).unwrap();
        d.receive_call(CallId(1)).unwrap();
        assert_eq!(texts(d.answer_call(op('A'))), ["Call 1 answered by operator A"]);
        assert_eq!(d.call_state(CallId(1)), Some(CallState::Active(op('A'))));
        assert_eq!(texts(d.hangup_call(CallId(1))), ["Call 1 finished and operator A available"]);
        assert_eq!(d.call_state(CallId(1)), None);
        assert_eq!(d.stats().available, 2);
    }

    #[test]
    fn test_finish_rings_next_queued_call() {
        let mut d = Dispatcher::new(1).unwrap();
        d.receive_call(CallId(1)).unwrap();
        d.receive_call(CallId(2)).unwrap();
        d.receive_call(CallId(3)).unwrap();
        d.answer_call(op('A')).unwrap();
        assert_eq!(
            texts(d.hangup_call(CallId(1))),
            ["Call 1 finished and operator A available", "Call 2 ringing for operator A"]
        );
        assert_eq!(d.queued_calls(), vec![CallId(3)]);
    }

    #[test]
    fn test_reject_with_no_other_operator_requeues() {
        let mut d = Dispatcher::new(1).unwrap();
        d.receive_call(CallId(7)).unwrap();
        assert_eq!(
            texts(d.reject_call(op('A'))),
            ["Call 7 rejected by operator A", "Call 7 waiting in queue"]
        );
        assert_eq!(d.queued_calls(), vec![CallId(7)]);
        assert!(d.operator(op('A')).unwrap().is_available());

        let mut d = Dispatcher::new(2).unwrap();
        d.receive_call(CallId(1)).unwrap();
        d.receive_call(CallId(2)).unwrap();
        d.answer_call(op('B')).unwrap();
        assert_eq!(
            texts(d.reject_call(op('A'))),
            ["Call 1 rejected by operator A", "Call 1 waiting in queue"]
        );
    }

    #[test]
    fn test_reject_rerings_same_operator_when_calls_wait() {
        let mut d = Dispatcher::new(2).unwrap();
        d.receive_call(CallId(1)).unwrap();
        d.receive_call(CallId(2)).unwrap();
        d.receive_call(CallId(3)).unwrap();
        let out = texts(d.reject_call(op('B')));
        assert_eq!(out, ["Call 2 rejected by operator B", "Call 2 ringing for operator B"]);
        assert_eq!(d.queued_calls(), vec![CallId(3)]);
        assert_eq!(d.stats().available, 0);
    }

    #[test]
    fn test_parked_call_keeps_its_place() {
        let mut d = Dispatcher::new(1).unwrap();
        d.receive_call(CallId(7)).unwrap();
        d.reject_call(op('A')).unwrap();

        // call 8 queues behind 7 and 7 goes back to A
        assert_eq!(
            texts(d.receive_call(CallId(8))),
            ["Call 8 received", "Call 8 waiting in queue", "Call 7 ringing for operator A"]
        );
        assert_eq!(d.queued_calls(), vec![CallId(8)]);
        assert_eq!(d.call_state(CallId(7)), Some(CallState::Ringing(op('A'))));
    }

    #[test]
    fn test_parked_call_goes_to_operator_freed_by_hangup() {
        let mut d = Dispatcher::new(2).unwrap();
        d.receive_call(CallId(1)).unwrap();
        d.receive_call(CallId(2)).unwrap();
        d.answer_call(op('B')).unwrap();
        d.reject_call(op('A')).unwrap();
        assert_eq!(d.queued_calls(), vec![CallId(1)]);

        assert_eq!(
            texts(d.hangup_call(CallId(2))),
            ["Call 2 finished and operator B available", "Call 1 ringing for operator B"]
        );
        assert!(d.queued_calls().is_empty());
        assert!(d.operator(op('A')).unwrap().is_available());
    }

    #[test]
    fn test_reject_moves_call_to_other_free_operator() {
        let mut d = Dispatcher::new(3).unwrap();
        d.receive_call(CallId(1)).unwrap();
        d.receive_call(CallId(2)).unwrap();
        d.receive_call(CallId(3)).unwrap();
        d.hangup_call(CallId(1)).unwrap();
        // A is free; C rejects, so call 3 moves to A
        assert_eq!(
            texts(d.reject_call(op('C'))),
            ["Call 3 rejected by operator C", "Call 3 ringing for operator A"]
        );
        assert!(d.operator(op('C')).unwrap().is_available());
    }

    #[test]
    fn test_hangup_queued_call_frees_nobody() {
        let mut d = Dispatcher::new(1).unwrap();
        d.receive_call(CallId(1)).unwrap();
        d.receive_call(CallId(2)).unwrap();
        d.receive_call(CallId(3)).unwrap();
        let before = d.stats();
        assert_eq!(texts(d.hangup_call(CallId(2))), ["Call 2 missed"]);
        assert_eq!(d.stats().ringing, before.ringing);
        assert_eq!(d.queued_calls(), vec![CallId(3)]);
    }

    #[test]
    fn test_invalid_events_leave_state_untouched() {
        let mut d = Dispatcher::new(2).unwrap();
        d.receive_call(CallId(1)).unwrap();
        d.receive_call(CallId(2)).unwrap();
        d.answer_call(op('B')).unwrap();
        d.receive_call(CallId(3)).unwrap();
        let snapshot = d.clone();

        assert!(matches!(d.receive_call(CallId(1)), Err(CallCenterError::InvalidTransition(_))));
        assert!(matches!(d.receive_call(CallId(3)), Err(CallCenterError::InvalidTransition(_))));
        assert!(matches!(d.answer_call(op('B')), Err(CallCenterError::InvalidTransition(_))));
        assert!(matches!(d.reject_call(op('B')), Err(CallCenterError::InvalidTransition(_))));
        assert!(matches!(d.answer_call(op('C')), Err(CallCenterError::UnknownOperator(_))));
        assert!(matches!(d.reject_call(op('Z')), Err(CallCenterError::UnknownOperator(_))));
        assert!(matches!(d.hangup_call(CallId(99)), Err(CallCenterError::InvalidTransition(_))));
        assert_eq!(d, snapshot);

        d.hangup_call(CallId(1)).unwrap();
        d.hangup_call(CallId(3)).unwrap();
        assert!(matches!(d.answer_call(op('A')), Err(CallCenterError::InvalidTransition(_))));
        assert!(matches!(d.hangup_call(CallId(1)), Err(CallCenterError::InvalidTransition(_))));
    }

    #[test]
    fn test_handle_dispatches_commands() {
        let mut d = Dispatcher::new(1).unwrap();
        assert_eq!(d.handle(&Command::Call(CallId(4))).unwrap().len(), 2);
        assert_eq!(
            d.handle(&Command::Answer(op('A'))).unwrap(),
            vec![Notification::Answered { call: CallId(4), operator: op('A') }]
        );
        assert_eq!(
            d.handle(&Command::Hangup(CallId(4))).unwrap(),
            vec![Notification::Finished { call: CallId(4), operator: op('A') }]
        );
        assert!(d.handle(&Command::Reject(op('A'))).is_err());
    }
}
