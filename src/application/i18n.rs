//! Localization lookup for the kiosk's two supported languages.
//!
//! `t(key)` is pure and total: an unknown key comes back verbatim so a
//! missing string can never panic the UI. The label→trigger map is
//! rebuilt from the active catalog on every call, which is what lets a
//! language switch take effect without touching the transition table.

use crate::domain::Trigger;
use std::collections::HashMap;

/// Supported display languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    En,
    Es,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::En, Language::Es];

    pub fn as_str(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Es => "es",
        }
    }

    pub fn toggled(self) -> Language {
        match self {
            Language::En => Language::Es,
            Language::Es => Language::En,
        }
    }
}

/// String catalog bound to the active language.
///
/// # Examples
///
/// ```
/// use tatm::application::{Language, Localizer};
///
/// let mut i18n = Localizer::default();
/// assert_eq!(i18n.t("buttons.withdraw"), "Withdraw");
/// i18n.toggle();
/// assert_eq!(i18n.language(), Language::Es);
/// assert_eq!(i18n.t("buttons.withdraw"), "Retirar");
/// assert_eq!(i18n.t("no.such.key"), "no.such.key");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Localizer {
    language: Language,
}

impl Localizer {
    pub fn new(language: Language) -> Self {
        Self { language }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Switch between the two supported languages.
    pub fn toggle(&mut self) {
        self.language = self.language.toggled();
    }

    /// Pure, total lookup; unknown keys are returned unchanged.
    pub fn t(&self, key: &str) -> String {
        lookup(self.language, key)
            .unwrap_or(key)
            .to_string()
    }

    /// Reverse map from rendered button labels to triggers, built
    /// fresh from the current catalog.
    pub fn label_trigger_map(&self) -> HashMap<String, Trigger> {
        Trigger::ALL
            .into_iter()
            .map(|trigger| (self.t(trigger.label_key()), trigger))
            .collect()
    }
}

fn lookup(language: Language, key: &str) -> Option<&'static str> {
    match language {
        Language::En => lookup_en(key),
        Language::Es => lookup_es(key),
    }
}

fn lookup_en(key: &str) -> Option<&'static str> {
    Some(match key {
        "buttons.enterPin" => "Enter PIN",
        "buttons.cancel" => "Cancel",
        "buttons.clear" => "Clear",
        "buttons.balance" => "Balance",
        "buttons.withdraw" => "Withdraw",
        "buttons.deposit" => "Deposit",
        "buttons.exit" => "Exit",
        "buttons.reEnterPin" => "Re-Enter PIN",
        "buttons.mainMenu" => "Main Menu",
        "buttons.confirm" => "Confirm",
        // The toggle shows the language it switches to.
        "languages.languageToggle" => "Español",
        "screens.welcomeTitle" => "Welcome to RustBank",
        "screens.welcomeHint" => "Press Enter PIN to begin",
        "screens.enterYourPin" => "Enter your PIN",
        "screens.authenticating" => "Authenticating...",
        "screens.mainMenuTitle" => "What would you like to do?",
        "screens.greeting" => "Hello",
        "screens.currentBalance" => "Your current balance",
        "screens.selectWithdrawAmount" => "Select withdrawal amount",
        "screens.selectDepositAmount" => "Enter deposit amount",
        "screens.amountEntered" => "Amount",
        "screens.processing" => "Processing...",
        "screens.loading" => "Loading...",
        "demo.demoPins" => "Demo PINs: 1234, 5678, 9999",
        _ => return None,
    })
}

fn lookup_es(key: &str) -> Option<&'static str> {
    Some(match key {
        "buttons.enterPin" => "Ingresar PIN",
        "buttons.cancel" => "Cancelar",
        "buttons.clear" => "Borrar",
        "buttons.balance" => "Saldo",
        "buttons.withdraw" => "Retirar",
        "buttons.deposit" => "Depositar",
        "buttons.exit" => "Salir",
        "buttons.reEnterPin" => "Reingresar PIN",
        "buttons.mainMenu" => "Menú Principal",
        "buttons.confirm" => "Confirmar",
        "languages.languageToggle" => "English",
        "screens.welcomeTitle" => "Bienvenido a RustBank",
        "screens.welcomeHint" => "Presione Ingresar PIN para comenzar",
        "screens.enterYourPin" => "Ingrese su PIN",
        "screens.authenticating" => "Autenticando...",
        "screens.mainMenuTitle" => "¿Qué desea hacer?",
        "screens.greeting" => "Hola",
        "screens.currentBalance" => "Su saldo actual",
        "screens.selectWithdrawAmount" => "Seleccione el monto a retirar",
        "screens.selectDepositAmount" => "Ingrese el monto a depositar",
        "screens.amountEntered" => "Monto",
        "screens.processing" => "Procesando...",
        "screens.loading" => "Cargando...",
        "demo.demoPins" => "PINs de demostración: 1234, 5678, 9999",
        _ => return None,
    })
}
