use std::fmt::{self, Display};

pub const INTENT_NEW_OUTGOING_SMS: &'static str = "android.provider.Telephony.NEW_OUTGOING_SMS";
pub const INTENT_SMS_RECEIVED: &'static str = "android.provider.Telephony.SMS_RECEIVED";
pub const INTENT_DATA_SMS_RECEIVED: &'static str = "android.intent.action.DATA_SMS_RECEIVED";
pub const INTENT_PHONE_STATE: &'static str = "android.intent.action.PHONE_STATE";
pub const INTENT_NEW_OUTGOING_CALL: &'static str = "android.intent.action.NEW_OUTGOING_CALL";

/// Broadcast actions whose receivers can intercept messages or watch calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensitiveIntent {
    NewOutgoingSms,
    SmsReceived,
    DataSmsReceived,
    PhoneState,
    NewOutgoingCall,
}

impl SensitiveIntent {
    pub const ALL: [SensitiveIntent; 5] = [
        Self::NewOutgoingSms,
        Self::SmsReceived,
        Self::DataSmsReceived,
        Self::PhoneState,
        Self::NewOutgoingCall,
    ];

    /// Returns `None` for any action that isn't tracked
    pub fn from_action(action: &str) -> Option<Self> {
        Some(match action {
            INTENT_NEW_OUTGOING_SMS => Self::NewOutgoingSms,
            INTENT_SMS_RECEIVED => Self::SmsReceived,
            INTENT_DATA_SMS_RECEIVED => Self::DataSmsReceived,
            INTENT_PHONE_STATE => Self::PhoneState,
            INTENT_NEW_OUTGOING_CALL => Self::NewOutgoingCall,
            _ => return None,
        })
    }

    pub fn action(&self) -> &'static str {
        match self {
            Self::NewOutgoingSms => INTENT_NEW_OUTGOING_SMS,
            Self::SmsReceived => INTENT_SMS_RECEIVED,
            Self::DataSmsReceived => INTENT_DATA_SMS_RECEIVED,
            Self::PhoneState => INTENT_PHONE_STATE,
            Self::NewOutgoingCall => INTENT_NEW_OUTGOING_CALL,
        }
    }

    /// Human readable finding for a receiver registered for this intent
    pub fn finding(&self, receiver: &str) -> String {
        let what = match self {
            Self::NewOutgoingSms => "Found a receiver to intercept outgoing SMS messages",
            Self::SmsReceived => "Found a receiver to intercept incoming SMS messages",
            Self::DataSmsReceived => "Found a receiver to intercept incoming data SMS message",
            Self::PhoneState => "Found a receiver monitoring telephony state/incoming calls",
            Self::NewOutgoingCall => "Found a receiver monitoring outgoing calls",
        };
        format!("{}: \"{}\"", what, receiver)
    }
}

impl Display for SensitiveIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.action())
    }
}
