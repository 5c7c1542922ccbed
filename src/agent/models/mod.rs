//! models — the model interface and a reference policy-gradient model.
//!
//! Purpose
//! -------
//! Define the narrow [`Model`] interface the agent drives and provide a
//! complete implementation, [`PolicyGradientModel`], whose update runs the
//! proposal + line-search step optimizer on an importance-weighted
//! surrogate objective.
//!
//! Key behaviors
//! -------------
//! - [`Model`]: `experience_capacity`, `experience`, `update`, `counters`.
//! - [`estimator`]: discounted returns with episode or fixed horizons.
//! - [`surrogate`]: masked linear softmax policy and its surrogate objective
//!   with an analytic gradient.
//! - [`policy_gradient`]: replay memory, seeded sampling and updates.
//!
//! Testing notes
//! -------------
//! - The surrogate gradient is checked against finite differences.
//! - A two-armed bandit checks that an update moves the policy toward the
//!   paying arm.

pub mod estimator;
pub mod model;
pub mod policy_gradient;
pub mod surrogate;

pub use self::estimator::{discounted_returns, EstimatorOptions, Horizon, ReturnEstimator};
pub use self::model::Model;
pub use self::policy_gradient::{PolicyGradientModel, PolicyGradientOptions};
pub use self::surrogate::{policy_probabilities, Surrogate, SurrogateData};

pub mod prelude {
    pub use super::estimator::{EstimatorOptions, Horizon};
    pub use super::model::Model;
    pub use super::policy_gradient::{PolicyGradientModel, PolicyGradientOptions};
}
