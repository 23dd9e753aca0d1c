/// Account and profile services
///
/// Each service is constructed once with its collaborators (store, settings,
/// notifier, photo storage) and cloned cheaply into request handlers.
///
/// - [`ledger::TokenLedger`]: one-time tokens for verification and reset
/// - [`authentication::AuthService`]: login gate, refresh, current account
/// - [`registration::RegistrationService`]: sign-up and account recovery
/// - [`professionals::ProfessionalService`]: listing and owner-only edits
/// - [`notifier`]: outbound email seam
/// - [`photos`]: photo storage seam

pub mod authentication;
pub mod ledger;
pub mod notifier;
pub mod photos;
pub mod professionals;
pub mod registration;
pub mod settings;

pub use authentication::{AuthError, AuthService};
pub use ledger::{LedgerError, TokenLedger};
pub use professionals::{ProfessionalError, ProfessionalService};
pub use registration::{RegistrationError, RegistrationService};
pub use settings::AuthSettings;
