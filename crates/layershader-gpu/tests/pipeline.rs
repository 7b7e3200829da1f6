//! End-to-end pipeline tests.
//!
//! These exercise real GPU work, so they need the host's OpenGL context to
//! be current on the test thread — exactly what an embedding application
//! provides and a bare test runner usually does not. Every test probes the
//! context first and skips (passing) when none is available, so the suite is
//! safe to run anywhere.

use std::sync::{Mutex, OnceLock};
use std::time::{Duration, Instant};

use layershader_core::{ComputeRequest, LayerInput, RasterRequest, Topology};
use layershader_glium::GpuContext;
use layershader_gpu::{run_compute, run_raster, TextureSet};

const IDENTITY_KERNEL: &str = r#"
#version 430
layout(local_size_x = 1, local_size_y = 1) in;
layout(rgba8, binding = 0) uniform image2D dst;
layout(rgba8, binding = 1) readonly uniform image2D src;
void main() {
    ivec2 p = ivec2(gl_GlobalInvocationID.xy);
    imageStore(dst, p, imageLoad(src, p));
}
"#;

const FULLSCREEN_VERT: &str = r#"
#version 330
out vec2 uv;
void main() {
    vec2 corners[3] = vec2[3](vec2(-1.0, -1.0), vec2(3.0, -1.0), vec2(-1.0, 3.0));
    vec2 pos = corners[gl_VertexID];
    uv = pos * 0.5 + 0.5;
    gl_Position = vec4(pos, 0.0, 1.0);
}
"#;

const SAMPLE_FRAG: &str = r#"
#version 330
in vec2 uv;
out vec4 color;
uniform sampler2D layer;
void main() {
    color = texture(layer, uv);
}
"#;

const SOLID_WHITE_FRAG: &str = r#"
#version 330
out vec4 color;
void main() {
    color = vec4(1.0);
}
"#;

fn try_context() -> Option<GpuContext> {
    static INIT: OnceLock<()> = OnceLock::new();
    INIT.get_or_init(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "info".into()),
            )
            .try_init()
            .ok();
    });

    let ctx = GpuContext::initialize();
    if ctx.is_available() {
        Some(ctx)
    } else {
        eprintln!("skipping: no OpenGL context is current on this thread");
        None
    }
}

/// A deterministic test image: every byte distinct enough to catch channel
/// or row mixups.
fn test_pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 37 % 251) as u8).collect()
}

fn rgba_input(pixels: &[u8], width: u32, height: u32) -> LayerInput<'_> {
    LayerInput {
        pixels,
        width,
        height,
        color_model: "RGBA",
        color_depth: "U8",
    }
}

#[test]
fn identity_compute_round_trip() -> anyhow::Result<()> {
    let Some(ctx) = try_context() else { return Ok(()) };

    let (w, h) = (13, 7);
    let pixels = test_pattern((w * h * 4) as usize);
    let input = rgba_input(&pixels, w, h);
    let request = ComputeRequest { x: w, y: h, z: 1 };

    let output = run_compute(&ctx, &input, IDENTITY_KERNEL, &request)?;
    assert_eq!(output, pixels);
    Ok(())
}

#[test]
fn identity_compute_round_trip_gray_alpha_16bit() -> anyhow::Result<()> {
    let Some(ctx) = try_context() else { return Ok(()) };

    let kernel = r#"
#version 430
layout(local_size_x = 1, local_size_y = 1) in;
layout(rg16, binding = 0) uniform image2D dst;
layout(rg16, binding = 1) readonly uniform image2D src;
void main() {
    ivec2 p = ivec2(gl_GlobalInvocationID.xy);
    imageStore(dst, p, imageLoad(src, p));
}
"#;

    let (w, h) = (5, 11);
    let pixels = test_pattern((w * h * 4) as usize);
    let input = LayerInput {
        pixels: &pixels,
        width: w,
        height: h,
        color_model: "GRAYA",
        color_depth: "U16",
    };
    let request = ComputeRequest { x: w, y: h, z: 1 };

    let output = run_compute(&ctx, &input, kernel, &request)?;
    assert_eq!(output, pixels);
    Ok(())
}

#[test]
fn identity_raster_round_trip() -> anyhow::Result<()> {
    let Some(ctx) = try_context() else { return Ok(()) };

    let (w, h) = (16, 9);
    let pixels = test_pattern((w * h * 4) as usize);
    let input = rgba_input(&pixels, w, h);
    let request = RasterRequest {
        vertex_count: Some(3),
        topology: Topology::Triangles,
    };

    let output = run_raster(&ctx, &input, FULLSCREEN_VERT, SAMPLE_FRAG, &request)?;
    assert_eq!(output, pixels);
    Ok(())
}

#[test]
fn invalid_kernel_reports_driver_log() {
    let Some(ctx) = try_context() else { return };

    let pixels = test_pattern(4 * 4 * 4);
    let input = rgba_input(&pixels, 4, 4);
    let request = ComputeRequest::default();

    let err = run_compute(&ctx, &input, "#version 430\nthis is not glsl", &request)
        .expect_err("garbage source must not compile");
    assert!(
        matches!(err, layershader_core::Error::Compile(_)),
        "unexpected error: {err:?}"
    );
    assert!(!err.diagnostic().trim().is_empty());

    // The pipeline stays usable after a failed compile.
    let output = run_compute(
        &ctx,
        &input,
        IDENTITY_KERNEL,
        &ComputeRequest { x: 4, y: 4, z: 1 },
    )
    .expect("follow-up run after a compile failure");
    assert_eq!(output, pixels);
}

#[test]
fn sentinel_vertex_count_draws_nothing() -> anyhow::Result<()> {
    let Some(ctx) = try_context() else { return Ok(()) };

    let pixels = vec![128u8; 8 * 8 * 4];
    let input = rgba_input(&pixels, 8, 8);

    // Sentinel: the attribute-less stream's own count (zero) is kept, so the
    // cleared output comes back untouched.
    let request = RasterRequest {
        vertex_count: None,
        topology: Topology::Triangles,
    };
    let output = run_raster(&ctx, &input, FULLSCREEN_VERT, SOLID_WHITE_FRAG, &request)?;
    assert!(output.iter().all(|&b| b == 0));

    // An explicit count overrides it and the triangle covers the canvas.
    let request = RasterRequest {
        vertex_count: Some(3),
        topology: Topology::Triangles,
    };
    let output = run_raster(&ctx, &input, FULLSCREEN_VERT, SOLID_WHITE_FRAG, &request)?;
    assert!(output.iter().all(|&b| b == 255));
    Ok(())
}

#[test]
fn texture_release_is_idempotent() {
    let Some(ctx) = try_context() else { return };

    ctx.with_context(|session| {
        session.activate()?;
        let format = layershader_core::PixelFormat::translate("RGBA", "U8").unwrap();
        let mut set = TextureSet::new(4, 4, format);
        set.create_input(session, &vec![0u8; 4 * 4 * 4])?;
        set.create_output(session)?;

        let (input_id, output_id) = (set.input_id(), set.output_id());
        assert_ne!(input_id, 0);
        assert_ne!(output_id, 0);

        set.release_all();
        assert_eq!(set.input_id(), 0);
        assert_eq!(set.output_id(), 0);
        unsafe {
            assert_eq!(gl::IsTexture(input_id), gl::FALSE);
            assert_eq!(gl::IsTexture(output_id), gl::FALSE);
        }

        // A second release must be a no-op.
        set.release_all();
        Ok(())
    })
    .unwrap();
}

#[test]
fn concurrent_invocations_are_serialized() {
    let Some(ctx) = try_context() else { return };

    // The closures below do no GL work; they only observe the exclusivity of
    // the acquisition itself, so running them from pool threads is fine.
    let intervals: &'static Mutex<Vec<(Instant, Instant)>> =
        Box::leak(Box::new(Mutex::new(Vec::new())));

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let ctx = ctx.clone();
            std::thread::spawn(move || {
                ctx.with_context(|_session| {
                    let start = Instant::now();
                    std::thread::sleep(Duration::from_millis(50));
                    intervals.lock().unwrap().push((start, Instant::now()));
                    Ok(())
                })
                .unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let intervals = intervals.lock().unwrap();
    assert_eq!(intervals.len(), 2);
    let (a, b) = (intervals[0], intervals[1]);
    let overlap = a.0 < b.1 && b.0 < a.1;
    assert!(!overlap, "acquisitions overlapped: {a:?} vs {b:?}");
}
