use catapult_core::{
    decode_state_change_info, CacheChangesRegistry, StateChangeInfo, StateChangeSubscriber,
};

use crate::error::SubscriberError;

/// Parses one `state_change` message and replays it into `subscriber`
/// (§4.7): a `Score_Change` payload is dispatched to `notify_score_change`,
/// never to `notify_state_change` — the two callbacks are distinct per
/// §4.7's discriminant dispatch. Stateless and re-entrant across distinct
/// messages; used both by the broker's normal poll loop and by the recovery
/// orchestrator (§4.8 step 3).
pub fn replay_state_change_message<S>(
    bytes: &[u8],
    registry: &CacheChangesRegistry,
    subscriber: &mut S,
) -> Result<(), SubscriberError>
where
    S: StateChangeSubscriber<Error = SubscriberError>,
{
    let info = decode_state_change_info(&mut &bytes[..], registry)?;
    match info {
        StateChangeInfo::ScoreChange(score) => subscriber.notify_score_change(score),
        other => subscriber.notify_state_change(&other),
    }
}
