use std::sync::Arc;

use mgmt_common::{keys, CoordinatorError, Dict, EntityKey, OperationCode, Uuid};
use mgmt_config::DispatchConfig;
use mgmt_lock::LockService;
use mgmt_roster::Roster;
use mgmt_rpc::{BrickOpFn, BrickOpPhase, CommitFn, PostValidateFn, PreValidateFn, RpcChannel, RpcRequest};
use mgmt_runtime::{current, Frame, Scheduler};
use mgmt_syncop::fan_out_parallel;
use tracing::{info, instrument, warn};

use crate::entities::entities_to_lock;
use crate::error::DispatchError;
use crate::result::DispatchResult;
use crate::transaction::TransactionContext;

/// The top-level orchestrator (spec §4.5): a single entry point that drives
/// the six phases over every eligible peer, honoring the lock-before-act,
/// unlock-on-every-exit, and cleanup-on-abort invariants. Each transaction
/// runs as its own Task on `runtime` (spec §4.1), carrying its originator
/// and operation as that Task's [`Frame`].
pub struct DispatchEngine {
    runtime: Arc<Scheduler>,
    lock_service: Arc<LockService>,
    roster: Arc<Roster>,
    channel: Arc<dyn RpcChannel>,
    pre_validate: Arc<dyn PreValidateFn>,
    brick_op: Arc<dyn BrickOpFn>,
    commit: Arc<dyn CommitFn>,
    post_validate: Arc<dyn PostValidateFn>,
    #[allow(dead_code)]
    config: DispatchConfig,
}

impl DispatchEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        runtime: Arc<Scheduler>,
        lock_service: Arc<LockService>,
        roster: Arc<Roster>,
        channel: Arc<dyn RpcChannel>,
        pre_validate: Arc<dyn PreValidateFn>,
        brick_op: Arc<dyn BrickOpFn>,
        commit: Arc<dyn CommitFn>,
        post_validate: Arc<dyn PostValidateFn>,
        config: DispatchConfig,
    ) -> Self {
        Self { runtime, lock_service, roster, channel, pre_validate, brick_op, commit, post_validate, config }
    }

    /// Validates the request and hands the rest of the transaction to a
    /// freshly spawned Task (spec §4.1 `spawn(fn, frame)`), then blocks on
    /// its [`mgmt_runtime::TaskHandle`] for the result. Validation happens
    /// here, before any Task exists, so malformed input never costs a lock.
    #[instrument(skip(self, input), fields(op = %op, originator = %originator))]
    pub async fn execute(&self, op: OperationCode, input: Dict, originator: Uuid) -> Result<DispatchResult, DispatchError> {
        let entities = entities_to_lock(&input)?;

        let runner = TransactionRunner {
            lock_service: self.lock_service.clone(),
            roster: self.roster.clone(),
            channel: self.channel.clone(),
            pre_validate: self.pre_validate.clone(),
            brick_op: self.brick_op.clone(),
            commit: self.commit.clone(),
            post_validate: self.post_validate.clone(),
        };
        let frame = Frame::new(originator, op);
        let handle = self.runtime.spawn(frame, async move { runner.run(input, entities).await });
        handle.join().await.map_err(DispatchError::from)?
    }
}

/// The owned, `'static` state one transaction's Task needs — a snapshot of
/// the engine's collaborators cheap to clone out of `&DispatchEngine` before
/// spawning, since the Task itself cannot borrow from its spawner.
struct TransactionRunner {
    lock_service: Arc<LockService>,
    roster: Arc<Roster>,
    channel: Arc<dyn RpcChannel>,
    pre_validate: Arc<dyn PreValidateFn>,
    brick_op: Arc<dyn BrickOpFn>,
    commit: Arc<dyn CommitFn>,
    post_validate: Arc<dyn PostValidateFn>,
}

impl TransactionRunner {
    /// Runs the six-phase pipeline for the Task's own [`Frame`] (spec §4.1
    /// `current()`), rather than taking the originator/operation as
    /// parameters a second time.
    async fn run(&self, input: Dict, entities: Vec<EntityKey>) -> Result<DispatchResult, DispatchError> {
        let frame = current();
        let op = frame.operation;
        let originator = frame.originator_uuid;

        let saved_roster_generation = self.roster.generation();
        let mut ctx = TransactionContext::new(originator, op.clone(), input, saved_roster_generation);

        let eligible = self.roster.eligible_peers(saved_roster_generation, op.relaxes_friendship_filter()).await;
        let targets: Vec<Uuid> = eligible.iter().map(|peer| peer.uuid).collect();
        ctx.peers_contacted = targets.clone();
        let selected = vec![true; targets.len()];

        // Phase 1: Lockdown.
        let lockdown_ok = self.lockdown(&mut ctx, &entities, &targets, &selected).await;

        if lockdown_ok {
            // Phase 3: Pre-validate.
            let pre_validate_ok = self.pre_validate_phase(&mut ctx).await;

            if pre_validate_ok {
                // Phase 4: Brick-op "pre".
                let brick_op_pre_ok = self.brick_op_phase(&mut ctx, BrickOpPhase::Pre).await;

                if brick_op_pre_ok {
                    // Phase 5: Commit — falls through regardless of outcome.
                    self.commit_phase(&mut ctx).await;
                    // Phase 6: Brick-op "post".
                    self.brick_op_phase(&mut ctx, BrickOpPhase::Post).await;
                    // Phase 7: Post-validate.
                    self.post_validate_phase(&mut ctx).await;
                } else {
                    // Brick-op pre failed: still run brick-op post to let peers
                    // disable any barriers, then skip straight to Unlock.
                    self.brick_op_phase(&mut ctx, BrickOpPhase::Post).await;
                }
            } else {
                // Pre-validate failed before any brick-op or commit ran: still
                // notify peers via post-validate(op_ret=failure) so they can
                // undo speculative state, then fall through to Unlock.
                self.post_validate_phase(&mut ctx).await;
            }
        }

        // Phase 8: Unlock — unconditional if any lock was acquired (spec §3 invariant 5).
        self.unlock(&mut ctx, &entities, &targets, &selected).await;

        Ok(DispatchResult {
            op_ret: ctx.op_ret(),
            op_errno: ctx.op_errno(),
            op_errstr: ctx.collated_errstr(),
            dict: ctx.response_dict(),
        })
    }

    async fn lockdown(&self, ctx: &mut TransactionContext, entities: &[EntityKey], targets: &[Uuid], selected: &[bool]) -> bool {
        if let Err(err) = self.lock_service.acquire_many(entities, ctx.originator_uuid).await {
            ctx.is_acquired = true;
            let coordinator_err: CoordinatorError = err.into();
            ctx.record_failure(format!("local lockdown failed: {coordinator_err}"), &coordinator_err);
            return false;
        }
        ctx.is_acquired = true;

        if targets.is_empty() {
            return true;
        }

        let request_dict = ctx.response_dict();
        let outcome = fan_out_parallel(self.channel.as_ref(), targets, selected, |_, peer| {
            RpcRequest::Lock { uuid: peer, op: ctx.op.clone(), dict: request_dict.clone() }
        })
        .await;

        let mut all_ok = true;
        for (index, reply) in outcome.replies.iter().enumerate() {
            match reply {
                Some(Ok(response)) => {
                    ctx.apply_peer_reply(targets[index], "lockdown", response);
                    if !response.is_ok() {
                        all_ok = false;
                    }
                }
                Some(Err(err)) => {
                    all_ok = false;
                    let coordinator_err: CoordinatorError = err.clone().into();
                    ctx.record_failure(format!("peer {} unreachable during lockdown: {coordinator_err}", targets[index]), &coordinator_err);
                }
                None => {}
            }
        }
        all_ok
    }

    /// Re-checks connectivity of every peer contacted at lockdown (spec §4.5
    /// "each remote phase ... submits one RPC per eligible peer"): the
    /// generation filter is frozen at transaction start, but a peer that
    /// drops its connection mid-transaction is excluded from every phase
    /// from the point of disconnection onward (spec §8 scenario C).
    async fn live_targets(&self, ctx: &TransactionContext) -> Vec<Uuid> {
        let mut live = Vec::with_capacity(ctx.peers_contacted.len());
        for &peer in &ctx.peers_contacted {
            if self.roster.get(peer).await.is_some_and(|peer| peer.connected) {
                live.push(peer);
            }
        }
        live
    }

    async fn pre_validate_phase(&self, ctx: &mut TransactionContext) -> bool {
        let input = ctx.input.clone();
        let local = self.pre_validate.pre_validate(&ctx.op, &input).await;
        let local_ok = self.apply_local_result(ctx, "pre-validate", local);

        let targets = self.live_targets(ctx).await;
        if targets.is_empty() {
            return local_ok;
        }

        let selected = vec![true; targets.len()];
        let request_dict = ctx.response_dict();
        let outcome = fan_out_parallel(self.channel.as_ref(), &targets, &selected, |_, peer| {
            RpcRequest::PreValidate { uuid: peer, op: ctx.op.clone(), dict: request_dict.clone() }
        })
        .await;
        let remote_ok = self.apply_fanout_outcome(ctx, &targets, "pre-validate", &outcome);

        local_ok && remote_ok
    }

    async fn brick_op_phase(&self, ctx: &mut TransactionContext, phase: BrickOpPhase) -> bool {
        let phase_name = match phase {
            BrickOpPhase::Pre => "brick-op-pre",
            BrickOpPhase::Post => "brick-op-post",
        };
        let input = ctx.input.clone();
        let local = self.brick_op.brick_op(phase, &ctx.op, &input).await;
        let local_ok = self.apply_local_result(ctx, phase_name, local);

        let targets = self.live_targets(ctx).await;
        if targets.is_empty() {
            return local_ok;
        }

        let selected = vec![true; targets.len()];
        let mut request_dict = ctx.response_dict();
        request_dict.insert(keys::OPERATION_TYPE, operation_type_tag(phase));
        let outcome = fan_out_parallel(self.channel.as_ref(), &targets, &selected, |_, peer| match phase {
            BrickOpPhase::Pre => RpcRequest::BrickOpPre { uuid: peer, op: ctx.op.clone(), dict: request_dict.clone() },
            BrickOpPhase::Post => RpcRequest::BrickOpPost { uuid: peer, op: ctx.op.clone(), dict: request_dict.clone() },
        })
        .await;
        let remote_ok = self.apply_fanout_outcome(ctx, &targets, phase_name, &outcome);

        local_ok && remote_ok
    }

    async fn commit_phase(&self, ctx: &mut TransactionContext) {
        let input = ctx.input.clone();
        let local = self.commit.commit(&ctx.op, &input).await;
        self.apply_local_result(ctx, "commit", local);

        let targets = self.live_targets(ctx).await;
        if targets.is_empty() {
            return;
        }

        let selected = vec![true; targets.len()];
        let request_dict = ctx.response_dict();
        let outcome = fan_out_parallel(self.channel.as_ref(), &targets, &selected, |_, peer| {
            RpcRequest::Commit { uuid: peer, op: ctx.op.clone(), dict: request_dict.clone() }
        })
        .await;
        self.apply_fanout_outcome(ctx, &targets, "commit", &outcome);
    }

    async fn post_validate_phase(&self, ctx: &mut TransactionContext) {
        let input = ctx.input.clone();
        let op_ret = ctx.op_ret();
        let local = self.post_validate.post_validate(&ctx.op, op_ret, &input).await;
        self.apply_local_result(ctx, "post-validate", local);

        let targets = self.live_targets(ctx).await;
        if targets.is_empty() {
            return;
        }

        let selected = vec![true; targets.len()];
        let request_dict = ctx.response_dict();
        let outcome = fan_out_parallel(self.channel.as_ref(), &targets, &selected, |_, peer| {
            RpcRequest::PostValidate { uuid: peer, op: ctx.op.clone(), op_ret, dict: request_dict.clone() }
        })
        .await;
        self.apply_fanout_outcome(ctx, &targets, "post-validate", &outcome);
    }

    async fn unlock(&self, ctx: &mut TransactionContext, entities: &[EntityKey], targets: &[Uuid], selected: &[bool]) {
        if !ctx.is_acquired {
            return;
        }

        if !targets.is_empty() {
            let request_dict = ctx.response_dict();
            let outcome = fan_out_parallel(self.channel.as_ref(), targets, selected, |_, peer| {
                RpcRequest::Unlock { uuid: peer, op: ctx.op.clone(), dict: request_dict.clone() }
            })
            .await;
            for (index, reply) in outcome.replies.iter().enumerate() {
                match reply {
                    Some(Ok(response)) => ctx.merge_peer_dict(&response.dict),
                    Some(Err(err)) => warn!(peer = %targets[index], error = %err, "peer unlock failed, continuing best-effort"),
                    None => {}
                }
            }
        }

        if let Err(err) = self.lock_service.release_many(entities, ctx.originator_uuid).await {
            warn!(error = %err, "local unlock best-effort failure");
        }
        info!("unlock phase complete");
    }

    /// Folds a local collaborator's result into the transaction context and
    /// tags the originator in the accumulated dictionary. Returns whether
    /// the phase should be considered successful.
    fn apply_local_result(&self, ctx: &mut TransactionContext, phase: &str, result: Result<Dict, CoordinatorError>) -> bool {
        match result {
            Ok(dict) => {
                ctx.merge_local_dict(&dict);
                true
            }
            Err(err) => {
                let local_err =
                    CoordinatorError::LocalPhaseFailure { phase: phase.to_string(), detail: err.to_string() };
                ctx.record_failure(format!("local phase {phase} failed: {err}"), &local_err);
                false
            }
        }
    }

    fn apply_fanout_outcome(
        &self,
        ctx: &mut TransactionContext,
        targets: &[Uuid],
        phase: &str,
        outcome: &mgmt_syncop::FanOutOutcome,
    ) -> bool {
        let mut all_ok = true;
        for (index, reply) in outcome.replies.iter().enumerate() {
            match reply {
                Some(Ok(response)) => {
                    ctx.apply_peer_reply(targets[index], phase, response);
                    if !response.is_ok() {
                        all_ok = false;
                    }
                }
                Some(Err(err)) => {
                    all_ok = false;
                    let coordinator_err: CoordinatorError = err.clone().into();
                    ctx.record_failure(
                        format!("peer {} unreachable during {phase}: {coordinator_err}", targets[index]),
                        &coordinator_err,
                    );
                }
                None => {}
            }
        }
        all_ok
    }
}

fn operation_type_tag(phase: BrickOpPhase) -> &'static str {
    match phase {
        BrickOpPhase::Pre => "pre",
        BrickOpPhase::Post => "post",
    }
}
