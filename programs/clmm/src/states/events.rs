//! The engine reports state changes through an [`EventSink`] supplied by the
//! hosting runtime; tests and simple embedders can pass a `Vec<Event>`.
use crate::states::pool::{
    AcceptRewardAuthEvent, CollectProtocolFeeEvent, CreatePoolEvent, SwapEvent,
    TransferRewardAuthEvent, UpdateEmissionEvent, UpdateFeeRateEvent,
};
use crate::states::position::{
    AddLiquidityEvent, ClosePositionEvent, CollectFeeEvent, CollectRewardEvent, OpenPositionEvent,
    RemoveLiquidityEvent,
};

#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    CreatePool(CreatePoolEvent),
    OpenPosition(OpenPositionEvent),
    ClosePosition(ClosePositionEvent),
    AddLiquidity(AddLiquidityEvent),
    RemoveLiquidity(RemoveLiquidityEvent),
    Swap(SwapEvent),
    CollectFee(CollectFeeEvent),
    CollectProtocolFee(CollectProtocolFeeEvent),
    CollectReward(CollectRewardEvent),
    UpdateFeeRate(UpdateFeeRateEvent),
    UpdateEmission(UpdateEmissionEvent),
    TransferRewardAuth(TransferRewardAuthEvent),
    AcceptRewardAuth(AcceptRewardAuthEvent),
}

pub trait EventSink {
    fn emit(&mut self, event: Event);
}

impl EventSink for Vec<Event> {
    fn emit(&mut self, event: Event) {
        self.push(event);
    }
}

/// Discards every event; for hosts that do not observe them.
#[derive(Default)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn emit(&mut self, _event: Event) {}
}
