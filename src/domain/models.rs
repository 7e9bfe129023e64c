use serde::{Deserialize, Serialize};
use std::fmt;

/// One discrete mode the kiosk can be in.
///
/// The active screen is the single source of truth for "where the user
/// is"; everything else (PIN buffer, pending amount) is transient state
/// interpreted relative to it.
///
/// # Examples
///
/// ```
/// use tatm::domain::ScreenId;
///
/// assert_eq!(ScreenId::MainMenu.as_str(), "main-menu");
/// assert!(ScreenId::Balance.requires_auth());
/// assert!(!ScreenId::Welcome.requires_auth());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScreenId {
    Welcome,
    PinEntry,
    MainMenu,
    Balance,
    Withdraw,
    Deposit,
}

impl ScreenId {
    /// Every screen, in the kiosk's canonical order.
    pub const ALL: [ScreenId; 6] = [
        ScreenId::Welcome,
        ScreenId::PinEntry,
        ScreenId::MainMenu,
        ScreenId::Balance,
        ScreenId::Withdraw,
        ScreenId::Deposit,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ScreenId::Welcome => "welcome",
            ScreenId::PinEntry => "pin-entry",
            ScreenId::MainMenu => "main-menu",
            ScreenId::Balance => "balance",
            ScreenId::Withdraw => "withdraw",
            ScreenId::Deposit => "deposit",
        }
    }

    /// Whether the screen sits in the authenticated region of the
    /// state machine.
    pub fn requires_auth(self) -> bool {
        matches!(
            self,
            ScreenId::MainMenu | ScreenId::Balance | ScreenId::Withdraw | ScreenId::Deposit
        )
    }
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized user intent, decoupled from the localized button label.
///
/// Labels are localized strings and change with the active language;
/// triggers are stable, so the transition table never changes when a
/// locale is added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    EnterPin,
    Cancel,
    Clear,
    Balance,
    Withdraw,
    Deposit,
    Exit,
    ReEnterPin,
    MainMenu,
    Confirm,
}

impl Trigger {
    pub const ALL: [Trigger; 10] = [
        Trigger::EnterPin,
        Trigger::Cancel,
        Trigger::Clear,
        Trigger::Balance,
        Trigger::Withdraw,
        Trigger::Deposit,
        Trigger::Exit,
        Trigger::ReEnterPin,
        Trigger::MainMenu,
        Trigger::Confirm,
    ];

    /// Localization key of the button label that maps to this trigger.
    pub fn label_key(self) -> &'static str {
        match self {
            Trigger::EnterPin => "buttons.enterPin",
            Trigger::Cancel => "buttons.cancel",
            Trigger::Clear => "buttons.clear",
            Trigger::Balance => "buttons.balance",
            Trigger::Withdraw => "buttons.withdraw",
            Trigger::Deposit => "buttons.deposit",
            Trigger::Exit => "buttons.exit",
            Trigger::ReEnterPin => "buttons.reEnterPin",
            Trigger::MainMenu => "buttons.mainMenu",
            Trigger::Confirm => "buttons.confirm",
        }
    }
}

/// Kind of financial transaction pending on a transaction screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Withdraw,
    Deposit,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionKind::Withdraw => f.write_str("withdraw"),
            TransactionKind::Deposit => f.write_str("deposit"),
        }
    }
}

/// Card network printed on the customer's card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardType {
    Visa,
    Mastercard,
    Maestro,
}

impl CardType {
    pub fn as_str(self) -> &'static str {
        match self {
            CardType::Visa => "VISA",
            CardType::Mastercard => "MASTERCARD",
            CardType::Maestro => "MAESTRO",
        }
    }
}

/// An authenticated customer as the backing API reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub card_type: CardType,
    pub balance: f64,
}

/// Number of side buttons per column on the physical bezel.
pub const SIDE_BUTTONS: usize = 4;

/// The two fixed-length columns of optional side-button labels for one
/// screen. A `None` slot renders no button and is never dispatchable.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenButtons {
    pub left: [Option<String>; SIDE_BUTTONS],
    pub right: [Option<String>; SIDE_BUTTONS],
}

/// Side-button layout for a screen, labels produced through the
/// localization lookup so the layout follows the active language.
pub fn screen_buttons(screen: ScreenId, t: &dyn Fn(&str) -> String) -> ScreenButtons {
    let lang = || Some(t("languages.languageToggle"));
    match screen {
        ScreenId::Welcome => ScreenButtons {
            left: [lang(), None, None, None],
            right: [None, None, None, Some(t("buttons.enterPin"))],
        },
        ScreenId::PinEntry => ScreenButtons {
            left: [lang(), None, None, None],
            right: [None, None, Some(t("buttons.clear")), Some(t("buttons.cancel"))],
        },
        ScreenId::MainMenu => ScreenButtons {
            left: [
                lang(),
                None,
                Some(t("buttons.withdraw")),
                Some(t("buttons.deposit")),
            ],
            right: [
                None,
                Some(t("buttons.exit")),
                Some(t("buttons.balance")),
                Some(t("buttons.reEnterPin")),
            ],
        },
        ScreenId::Balance => ScreenButtons {
            left: [lang(), None, None, None],
            right: [None, None, Some(t("buttons.mainMenu")), None],
        },
        ScreenId::Withdraw | ScreenId::Deposit => ScreenButtons {
            left: [lang(), None, None, None],
            right: [
                None,
                Some(t("buttons.cancel")),
                Some(t("buttons.confirm")),
                Some(t("buttons.mainMenu")),
            ],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_regions_are_split_as_documented() {
        let gated: Vec<ScreenId> = ScreenId::ALL
            .into_iter()
            .filter(|s| s.requires_auth())
            .collect();
        assert_eq!(
            gated,
            vec![
                ScreenId::MainMenu,
                ScreenId::Balance,
                ScreenId::Withdraw,
                ScreenId::Deposit
            ]
        );
    }

    #[test]
    fn user_round_trips_camel_case() {
        let json = r#"{"id":"1","name":"Peter Parker","cardType":"visa","balance":1500.0}"#;
        let user: User = serde_json::from_str(json).expect("valid user payload");
        assert_eq!(user.card_type, CardType::Visa);
        assert_eq!(
            serde_json::to_value(&user).expect("serialize")["cardType"],
            "visa"
        );
    }

    #[test]
    fn empty_slots_render_no_button() {
        let t = |key: &str| key.to_string();
        let buttons = screen_buttons(ScreenId::Balance, &t);
        assert_eq!(buttons.right[2].as_deref(), Some("buttons.mainMenu"));
        assert!(buttons.right[3].is_none());
        assert!(buttons.left[1].is_none());
    }
}
