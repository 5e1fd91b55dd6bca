//! Copula samplers for the chunk-coupled topic draws.
//!
//! Every family here is Archimedean and is sampled with the Marshall–Olkin
//! construction: draw a frailty `V` whose Laplace transform is the family
//! generator `ψ`, draw `E_1..E_d` i.i.d. standard exponential, and return
//! `U_i = ψ(E_i / V)`. The marginals are uniform and the shared frailty
//! induces the dependence.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use rand::{Rng, RngCore};
use rand_distr::{Distribution, Exp1, Gamma};
use statrs::function::gamma::ln_gamma;

use crate::error::{LdaError, Result};

/// Source of joint uniform vectors for multi-token chunks.
///
/// The sampler calls this once per chunk of length > 1 and per epoch. Any
/// randomness must be drawn from `rng` so a seeded model stays reproducible.
///
/// The returned vector must have exactly `dimension` entries, each in the
/// closed interval `[0, 1]`. The endpoints are accepted: draws at the limit of
/// strong dependence legitimately land on 0 or 1. Anything else (NaN, values
/// outside the interval, a wrong length) aborts the epoch.
pub trait CopulaSampler {
    fn sample(&mut self, dimension: usize, rng: &mut dyn RngCore) -> Result<Vec<f64>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CopulaFamily {
    Independence,
    Amh,
    Clayton,
    Frank,
    Gumbel,
    Joe,
}

impl CopulaFamily {
    pub fn name(&self) -> &'static str {
        match self {
            CopulaFamily::Independence => "Independence",
            CopulaFamily::Amh => "AMH",
            CopulaFamily::Clayton => "Clayton",
            CopulaFamily::Frank => "Frank",
            CopulaFamily::Gumbel => "Gumbel",
            CopulaFamily::Joe => "Joe",
        }
    }

    /// Check `theta` against the admissible range of the family.
    pub fn check_parameter(&self, theta: f64) -> Result<()> {
        let reason = match self {
            CopulaFamily::Independence => None,
            _ if !theta.is_finite() => Some("parameter must be finite"),
            CopulaFamily::Amh if !(0.0..1.0).contains(&theta) => {
                Some("parameter must lie in [0, 1)")
            }
            CopulaFamily::Clayton | CopulaFamily::Frank if theta <= 0.0 => {
                Some("parameter must be positive")
            }
            CopulaFamily::Gumbel | CopulaFamily::Joe if theta < 1.0 => {
                Some("parameter must be at least 1")
            }
            _ => None,
        };
        match reason {
            Some(reason) => Err(LdaError::InvalidCopulaParameter {
                family: self.name().to_string(),
                parameter: theta,
                reason: reason.to_string(),
            }),
            None => Ok(()),
        }
    }
}

impl fmt::Display for CopulaFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CopulaFamily {
    type Err = LdaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "independence" | "indep" => Ok(CopulaFamily::Independence),
            "amh" | "ali-mikhail-haq" => Ok(CopulaFamily::Amh),
            "clayton" => Ok(CopulaFamily::Clayton),
            "frank" => Ok(CopulaFamily::Frank),
            "gumbel" => Ok(CopulaFamily::Gumbel),
            "joe" => Ok(CopulaFamily::Joe),
            _ => Err(LdaError::UnknownCopulaFamily(s.to_string())),
        }
    }
}

/// Archimedean copula of one family with a fixed dependence parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArchimedeanCopula {
    family: CopulaFamily,
    theta: f64,
}

impl ArchimedeanCopula {
    pub fn new(family: CopulaFamily, theta: f64) -> Result<Self> {
        family.check_parameter(theta)?;
        Ok(Self { family, theta })
    }

    pub fn family(&self) -> CopulaFamily {
        self.family
    }

    pub fn theta(&self) -> f64 {
        self.theta
    }

    /// Draw the frailty variable `V`. Underflow to 0 and overflow to +inf are
    /// the limits of extreme dependence and are passed through.
    fn frailty(&self, rng: &mut dyn RngCore) -> Result<f64> {
        let theta = self.theta;
        let v = match self.family {
            CopulaFamily::Independence => 1.0,
            CopulaFamily::Amh => sample_geometric(theta, rng),
            CopulaFamily::Clayton => Gamma::new(1.0 / theta, 1.0)
                .map_err(|e| LdaError::CopulaFailure(e.to_string()))?
                .sample(rng),
            CopulaFamily::Frank => sample_logarithmic(-(-theta).exp_m1(), theta, rng),
            CopulaFamily::Gumbel => sample_positive_stable(1.0 / theta, rng),
            CopulaFamily::Joe => sample_sibuya(1.0 / theta, rng),
        };
        if v >= 0.0 {
            Ok(v)
        } else {
            Err(LdaError::CopulaFailure(format!(
                "{} frailty draw produced {}",
                self.family, v
            )))
        }
    }

    /// Generator `ψ(t)`, the Laplace transform of the frailty.
    fn generator(&self, t: f64) -> f64 {
        let theta = self.theta;
        match self.family {
            CopulaFamily::Independence => (-t).exp(),
            CopulaFamily::Amh => (1.0 - theta) / (t.exp() - theta),
            CopulaFamily::Clayton => (1.0 + t).powf(-1.0 / theta),
            CopulaFamily::Frank => {
                let p = -(-theta).exp_m1();
                -(-p * (-t).exp()).ln_1p() / theta
            }
            CopulaFamily::Gumbel => (-t.powf(1.0 / theta)).exp(),
            CopulaFamily::Joe => 1.0 - (-(-t).exp_m1()).powf(1.0 / theta),
        }
    }
}

impl CopulaSampler for ArchimedeanCopula {
    fn sample(&mut self, dimension: usize, rng: &mut dyn RngCore) -> Result<Vec<f64>> {
        let v = self.frailty(rng)?;
        if v == 0.0 {
            // ψ(∞)
            return Ok(vec![0.0; dimension]);
        }
        let u = (0..dimension)
            .map(|_| {
                let e: f64 = Exp1.sample(rng);
                self.generator(e / v).clamp(0.0, 1.0)
            })
            .collect::<Vec<_>>();
        log::trace!("{} copula draw (d={dimension}, V={v}): {:?}", self.family, u);
        Ok(u)
    }
}

/// Geometric on {1, 2, ...} with success probability `1 - theta`.
fn sample_geometric(theta: f64, rng: &mut dyn RngCore) -> f64 {
    if theta <= 0.0 {
        return 1.0;
    }
    let u = 1.0 - rng.gen::<f64>();
    (u.ln() / theta.ln()).ceil().max(1.0)
}

/// Logarithmic series distribution with parameter `p = 1 - exp(-theta)`
/// (Kemp's LK algorithm).
fn sample_logarithmic(p: f64, theta: f64, rng: &mut dyn RngCore) -> f64 {
    let u2 = 1.0 - rng.gen::<f64>();
    if u2 > p {
        return 1.0;
    }
    let u1: f64 = rng.gen();
    let q = -(-theta * u1).exp_m1();
    if u2 < q * q {
        // ln q without forming q, which rounds to 1 once theta·u1 is large
        let ln_q = (-(-theta * u1).exp()).ln_1p();
        if ln_q == 0.0 {
            return f64::INFINITY;
        }
        (1.0 + u2.ln() / ln_q).floor()
    } else if u2 > q {
        1.0
    } else {
        2.0
    }
}

/// Positive stable variable with Laplace transform `exp(-t^alpha)`,
/// `0 < alpha <= 1` (Kanter's representation).
fn sample_positive_stable(alpha: f64, rng: &mut dyn RngCore) -> f64 {
    if alpha >= 1.0 {
        return 1.0;
    }
    let u = PI * (1.0 - rng.gen::<f64>());
    let w: f64 = Exp1.sample(rng);
    let a = ((alpha * u).sin().powf(alpha) * ((1.0 - alpha) * u).sin().powf(1.0 - alpha)
        / u.sin())
    .powf(1.0 / (1.0 - alpha));
    (a / w).powf((1.0 - alpha) / alpha)
}

/// Sibuya distribution with parameter `alpha`, sampled by inverting its
/// survival function `S(n) = Γ(n + 1 - α) / (Γ(n + 1) Γ(1 - α))`.
fn sample_sibuya(alpha: f64, rng: &mut dyn RngCore) -> f64 {
    let u: f64 = rng.gen();
    if u <= alpha || alpha >= 1.0 {
        return 1.0;
    }
    let target = (1.0 - u).ln();
    let ln_c = ln_gamma(1.0 - alpha);
    let ln_survival = |n: f64| ln_gamma(n + 1.0 - alpha) - ln_gamma(n + 1.0) - ln_c;

    // smallest n with S(n) <= 1 - u; S is decreasing and S(1) > 1 - u here
    const MAX: f64 = 9_007_199_254_740_992.0;
    let mut lo = 1.0;
    let mut hi = 2.0;
    while ln_survival(hi) > target {
        lo = hi;
        hi *= 2.0;
        if hi >= MAX {
            return MAX;
        }
    }
    while hi - lo > 1.0 {
        let mid = ((lo + hi) / 2.0).floor();
        if ln_survival(mid) > target {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    hi
}
