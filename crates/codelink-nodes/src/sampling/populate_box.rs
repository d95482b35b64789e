//! Populate Box Node
//!
//! Scatters points uniformly inside an axis-aligned box, keeping every
//! pair of points at least `Distance` apart.

use codelink_core::{
    EvalContext, EvaluationError, NodeCategory, NodeDefinition, NodeDescriptor, NodeEvaluator,
    SocketKind, SocketSpec, Value,
};

use crate::math::leaf_number;

/// Parameters of one box sampling run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxSampling {
    pub min: [f64; 3],
    pub max: [f64; 3],
    pub count: usize,
    /// Minimum distance between any two points; 0 disables the check
    pub distance: f64,
    pub seed: u64,
}

/// Sample `params.count` points, giving up after `max_attempts` candidates
///
/// The same parameters always yield the same points. Each attempt places at
/// most one point, so a count above `max_attempts` fails before sampling.
pub fn populate_box(
    params: &BoxSampling,
    max_attempts: usize,
) -> Result<Vec<[f64; 3]>, EvaluationError> {
    if params.count > max_attempts {
        log::warn!(
            "Cannot place {} points within {} attempts",
            params.count,
            max_attempts
        );
        return Err(EvaluationError::ResourceExhausted {
            attempts: max_attempts,
        });
    }

    let mut rng = fastrand::Rng::with_seed(params.seed);
    let lower: [f64; 3] = std::array::from_fn(|i| params.min[i].min(params.max[i]));
    let upper: [f64; 3] = std::array::from_fn(|i| params.min[i].max(params.max[i]));
    let min_sq = params.distance * params.distance;

    let mut points: Vec<[f64; 3]> = Vec::with_capacity(params.count);
    let mut attempts = 0;
    while points.len() < params.count {
        if attempts >= max_attempts {
            log::warn!(
                "Placed {} of {} points before giving up",
                points.len(),
                params.count
            );
            return Err(EvaluationError::ResourceExhausted { attempts });
        }
        attempts += 1;

        let candidate: [f64; 3] =
            std::array::from_fn(|i| lower[i] + rng.f64() * (upper[i] - lower[i]));
        let clear = params.distance <= 0.0
            || points.iter().all(|p| {
                let d: f64 = (0..3).map(|i| (p[i] - candidate[i]).powi(2)).sum();
                d >= min_sq
            });
        if clear {
            points.push(candidate);
        }
    }

    log::debug!("Placed {} points in {} attempts", points.len(), attempts);
    Ok(points)
}

/// Point distribution in a box
///
/// # Inputs
/// - `Min`, `Max` - opposite corners (components are sorted per axis)
/// - `Count` - number of points, a non-negative whole number (default 10)
/// - `Distance` - minimum spacing between points (default 0)
/// - `Seed` - random seed, a non-negative whole number (default 0)
///
/// # Outputs
/// - `Points` - list of vectors
#[derive(Debug, Default, Clone, Copy)]
pub struct PopulateBox;

impl PopulateBox {
    pub const CLASS: &'static str = "codelink.sampling.PopulateBox";
    pub const PORT_MIN: &'static str = "Min";
    pub const PORT_MAX: &'static str = "Max";
    pub const PORT_COUNT: &'static str = "Count";
    pub const PORT_DISTANCE: &'static str = "Distance";
    pub const PORT_SEED: &'static str = "Seed";
    pub const PORT_POINTS: &'static str = "Points";
}

impl NodeDefinition for PopulateBox {
    fn descriptor() -> NodeDescriptor {
        NodeDescriptor::new(Self::CLASS, NodeCategory::Sampling, "Populate Box")
            .describe("Scatters points inside a box with a minimum spacing")
            .input(SocketSpec::new(Self::PORT_MIN, SocketKind::Vector))
            .input(
                SocketSpec::new(Self::PORT_MAX, SocketKind::Vector).with_default([1.0, 1.0, 1.0]),
            )
            .input(SocketSpec::new(Self::PORT_COUNT, SocketKind::Scalar).with_default(10.0))
            .input(SocketSpec::new(Self::PORT_DISTANCE, SocketKind::Scalar))
            .input(SocketSpec::new(Self::PORT_SEED, SocketKind::Scalar))
            .output(SocketSpec::new(Self::PORT_POINTS, SocketKind::Any))
    }
}

fn corner(value: &Value, socket: &str) -> Result<[f64; 3], EvaluationError> {
    value.as_vector().ok_or_else(|| {
        EvaluationError::invalid_input(socket, format!("vector, got {}", value.type_name()))
    })
}

fn whole(value: &Value, socket: &str) -> Result<usize, EvaluationError> {
    let n = leaf_number(value, socket)?;
    if n < 0.0 || n.fract() != 0.0 || !n.is_finite() {
        return Err(EvaluationError::invalid_input(socket, "non-negative whole number"));
    }
    Ok(n as usize)
}

impl NodeEvaluator for PopulateBox {
    fn evaluate(&self, ctx: &EvalContext<'_>, inputs: &[Value]) -> Result<Value, EvaluationError> {
        let [min, max, count, distance, seed] = inputs else {
            return Err(EvaluationError::failed("expected five inputs"));
        };
        let params = BoxSampling {
            min: corner(min, Self::PORT_MIN)?,
            max: corner(max, Self::PORT_MAX)?,
            count: whole(count, Self::PORT_COUNT)?,
            distance: leaf_number(distance, Self::PORT_DISTANCE)?,
            seed: whole(seed, Self::PORT_SEED)? as u64,
        };
        let points = populate_box(&params, ctx.config.max_sample_attempts)?;
        Ok(Value::List(points.into_iter().map(Value::Vector).collect()))
    }
}

inventory::submit!(codelink_core::RegistrationFn(
    codelink_core::NodeRegistration::of::<PopulateBox>
));

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box(count: usize, distance: f64) -> BoxSampling {
        BoxSampling {
            min: [0.0; 3],
            max: [1.0; 3],
            count,
            distance,
            seed: 7,
        }
    }

    #[test]
    fn test_points_stay_inside() {
        let points = populate_box(&unit_box(50, 0.0), 1_000).unwrap();
        assert_eq!(points.len(), 50);
        for p in &points {
            assert!(p.iter().all(|c| (0.0..=1.0).contains(c)));
        }
    }

    #[test]
    fn test_same_seed_same_points() {
        let first = populate_box(&unit_box(20, 0.1), 10_000).unwrap();
        let second = populate_box(&unit_box(20, 0.1), 10_000).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_minimum_distance_respected() {
        let points = populate_box(&unit_box(20, 0.2), 10_000).unwrap();
        for (i, a) in points.iter().enumerate() {
            for b in &points[i + 1..] {
                let d: f64 = (0..3).map(|k| (a[k] - b[k]).powi(2)).sum::<f64>().sqrt();
                assert!(d >= 0.2);
            }
        }
    }

    #[test]
    fn test_impossible_request_is_exhausted() {
        // Two points cannot be 5 apart inside a unit box
        let err = populate_box(&unit_box(2, 5.0), 100).unwrap_err();
        assert_eq!(err, EvaluationError::ResourceExhausted { attempts: 100 });
    }

    #[test]
    fn test_huge_count_fails_before_sampling() {
        let err = populate_box(&unit_box(1_000_000_000_000, 0.0), 100).unwrap_err();
        assert_eq!(err, EvaluationError::ResourceExhausted { attempts: 100 });
    }

    #[test]
    fn test_zero_count() {
        assert!(populate_box(&unit_box(0, 0.0), 0).unwrap().is_empty());
    }
}
