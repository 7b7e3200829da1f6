//! GL error-queue helpers.

use gl::types::GLenum;

/// Drop anything already sitting in the GL error queue so later drains only
/// see errors raised by the current stage.
pub(crate) fn clear_gl_errors() {
    unsafe { while gl::GetError() != gl::NO_ERROR {} }
}

/// Drain the GL error queue, returning a readable summary if anything was
/// raised.
pub(crate) fn drain_gl_errors() -> Option<String> {
    let mut names = Vec::new();
    loop {
        let code = unsafe { gl::GetError() };
        if code == gl::NO_ERROR || names.len() >= 8 {
            break;
        }
        names.push(gl_error_name(code));
    }

    if names.is_empty() {
        None
    } else {
        Some(names.join(", "))
    }
}

fn gl_error_name(code: GLenum) -> String {
    match code {
        gl::INVALID_ENUM => "GL_INVALID_ENUM".into(),
        gl::INVALID_VALUE => "GL_INVALID_VALUE".into(),
        gl::INVALID_OPERATION => "GL_INVALID_OPERATION".into(),
        gl::INVALID_FRAMEBUFFER_OPERATION => "GL_INVALID_FRAMEBUFFER_OPERATION".into(),
        gl::OUT_OF_MEMORY => "GL_OUT_OF_MEMORY".into(),
        _ => format!("GL error 0x{code:04x}"),
    }
}
