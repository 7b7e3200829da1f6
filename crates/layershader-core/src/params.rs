//! Execution parameters for the two dispatch protocols.
//!
//! Hosts hand these over as text (they come from settings files and dialog
//! fields), so parsing is recoverable: a malformed field keeps the prior
//! configuration's value and the run continues. Only [`ParameterError`]s are
//! produced, never fatal errors.

use num_derive::FromPrimitive;
use num_traits::FromPrimitive as _;
use tracing::warn;

use crate::error::ParameterError;

/// Work-group counts for a compute dispatch. All three must be positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComputeRequest {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl Default for ComputeRequest {
    fn default() -> Self {
        Self { x: 1, y: 1, z: 1 }
    }
}

impl ComputeRequest {
    /// Parse host-supplied work-group fields.
    ///
    /// Each field that fails to parse as a positive integer retains the
    /// value from `prior` and contributes a [`ParameterError`]; the request
    /// is always usable.
    pub fn parse(x: &str, y: &str, z: &str, prior: &Self) -> (Self, Vec<ParameterError>) {
        let mut errors = Vec::new();
        let request = Self {
            x: parse_field("workgroup X", x, prior.x, &mut errors),
            y: parse_field("workgroup Y", y, prior.y, &mut errors),
            z: parse_field("workgroup Z", z, prior.z, &mut errors),
        };
        (request, errors)
    }
}

fn parse_field(
    field: &'static str,
    text: &str,
    prior: u32,
    errors: &mut Vec<ParameterError>,
) -> u32 {
    match text.trim().parse::<u32>() {
        Ok(value) if value > 0 => value,
        Ok(_) => {
            push_error(field, "must be a positive integer".into(), prior, errors);
            prior
        }
        Err(e) => {
            push_error(field, e.to_string(), prior, errors);
            prior
        }
    }
}

fn push_error(field: &'static str, reason: String, kept: u32, errors: &mut Vec<ParameterError>) {
    warn!(field, %reason, kept, "malformed execution parameter, keeping previous value");
    errors.push(ParameterError { field, reason });
}

/// Primitive assembly mode for the raster path, selected by index 0..=6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
pub enum Topology {
    Points = 0,
    Lines = 1,
    LineLoop = 2,
    LineStrip = 3,
    Triangles = 4,
    TriangleStrip = 5,
    TriangleFan = 6,
}

impl Default for Topology {
    fn default() -> Self {
        Self::Triangles
    }
}

impl Topology {
    /// Map a host index to a topology. Anything outside 0..=6 falls back to
    /// [`Topology::Triangles`].
    pub fn from_index(index: i64) -> Self {
        Self::from_i64(index).unwrap_or_default()
    }
}

/// Parameters for a raster draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RasterRequest {
    /// `None` is the "-1" sentinel: the draw keeps the vertex stream's own
    /// count (zero for the attribute-less stream this pipeline uses — the
    /// shader is expected to synthesize vertices from `gl_VertexID`).
    /// `Some(n)` overrides the count to exactly `n`.
    pub vertex_count: Option<u32>,
    pub topology: Topology,
}

impl RasterRequest {
    /// Parse host-supplied vertex-count and topology-index fields.
    ///
    /// A malformed vertex count keeps `prior`'s value; a malformed or
    /// out-of-range topology index falls back to [`Topology::Triangles`].
    /// Both report a [`ParameterError`] without aborting.
    pub fn parse(
        vertex_count: &str,
        topology_index: &str,
        prior: &Self,
    ) -> (Self, Vec<ParameterError>) {
        let mut errors = Vec::new();

        let vertex_count = match vertex_count.trim().parse::<i64>() {
            Ok(-1) => None,
            Ok(n) if n >= 0 => Some(n as u32),
            Ok(n) => {
                warn!(value = n, "vertex count out of range, keeping previous value");
                errors.push(ParameterError {
                    field: "vertex count",
                    reason: format!("{n} is out of range (expected -1 or a non-negative count)"),
                });
                prior.vertex_count
            }
            Err(e) => {
                warn!(reason = %e, "malformed vertex count, keeping previous value");
                errors.push(ParameterError {
                    field: "vertex count",
                    reason: e.to_string(),
                });
                prior.vertex_count
            }
        };

        let topology = match topology_index.trim().parse::<i64>() {
            Ok(index) => Topology::from_index(index),
            Err(e) => {
                warn!(reason = %e, "malformed topology index, falling back to triangles");
                errors.push(ParameterError {
                    field: "topology index",
                    reason: e.to_string(),
                });
                Topology::Triangles
            }
        };

        (Self { vertex_count, topology }, errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_parse_valid() {
        let prior = ComputeRequest::default();
        let (req, errors) = ComputeRequest::parse("64", "32", "1", &prior);
        assert_eq!(req, ComputeRequest { x: 64, y: 32, z: 1 });
        assert!(errors.is_empty());
    }

    #[test]
    fn test_compute_parse_keeps_prior_per_field() {
        let prior = ComputeRequest { x: 8, y: 9, z: 10 };
        let (req, errors) = ComputeRequest::parse("16", "banana", "0", &prior);
        // Malformed Y and non-positive Z keep the prior values; X updates.
        assert_eq!(req, ComputeRequest { x: 16, y: 9, z: 10 });
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field, "workgroup Y");
        assert_eq!(errors[1].field, "workgroup Z");
    }

    #[test]
    fn test_topology_index_table() {
        assert_eq!(Topology::from_index(0), Topology::Points);
        assert_eq!(Topology::from_index(2), Topology::LineLoop);
        assert_eq!(Topology::from_index(4), Topology::Triangles);
        assert_eq!(Topology::from_index(6), Topology::TriangleFan);
    }

    #[test]
    fn test_topology_out_of_range_falls_back_to_triangles() {
        assert_eq!(Topology::from_index(7), Topology::Triangles);
        assert_eq!(Topology::from_index(99), Topology::Triangles);
        assert_eq!(Topology::from_index(-3), Topology::Triangles);
    }

    #[test]
    fn test_raster_parse_sentinel_and_override() {
        let prior = RasterRequest::default();

        let (req, errors) = RasterRequest::parse("-1", "4", &prior);
        assert_eq!(req.vertex_count, None);
        assert_eq!(req.topology, Topology::Triangles);
        assert!(errors.is_empty());

        let (req, errors) = RasterRequest::parse("7", "5", &prior);
        assert_eq!(req.vertex_count, Some(7));
        assert_eq!(req.topology, Topology::TriangleStrip);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_raster_parse_recovers() {
        let prior = RasterRequest {
            vertex_count: Some(12),
            topology: Topology::LineStrip,
        };

        let (req, errors) = RasterRequest::parse("lots", "99", &prior);
        assert_eq!(req.vertex_count, Some(12));
        assert_eq!(req.topology, Topology::Triangles);
        // Only the vertex count is an error; 99 parses and falls back.
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "vertex count");

        let (req, errors) = RasterRequest::parse("-5", "x", &prior);
        assert_eq!(req.vertex_count, Some(12));
        assert_eq!(req.topology, Topology::Triangles);
        assert_eq!(errors.len(), 2);
    }
}
