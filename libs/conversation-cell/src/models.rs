use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use appointment_cell::models::Slot;
use sobreturno_cell::SobreturnoSlot;

/// Which booking flow the session belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FlowKind {
    Turnos,
    Sobreturno,
}

/// Where the conversation stands. Terminal outcomes (confirmed, cancelled)
/// are never stored: reaching one clears the session, so the next inbound
/// message starts fresh.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ConversationState {
    CollectingName,
    CollectingPlan,
    AwaitingSelection,
}

/// Per-phone conversation state. The displayed option lists are stored
/// verbatim: the user answers with a position (or sobreturno number), and
/// the booking must resolve against exactly what was shown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSession {
    pub flow: FlowKind,
    pub state: ConversationState,
    pub client_name: Option<String>,
    pub social_work: Option<String>,
    pub appointment_date: Option<NaiveDate>,
    pub available_slots: Vec<Slot>,
    pub selected_slot: Option<Slot>,
    pub available_sobreturnos: Vec<SobreturnoSlot>,
    pub invalid_name: bool,
}

impl ConversationSession {
    pub fn new(flow: FlowKind) -> Self {
        Self {
            flow,
            state: ConversationState::CollectingName,
            client_name: None,
            social_work: None,
            appointment_date: None,
            available_slots: Vec::new(),
            selected_slot: None,
            available_sobreturnos: Vec::new(),
            invalid_name: false,
        }
    }
}

/// Inbound chat turn as delivered by the transport webhook.
#[derive(Debug, Deserialize)]
pub struct InboundMessage {
    pub from: String,
    pub body: String,
}

#[derive(Debug, Serialize)]
pub struct OutboundReplies {
    pub replies: Vec<String>,
}
