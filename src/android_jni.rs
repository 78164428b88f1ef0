//! JNI bindings for the Android shell.
//!
//! Each public function here corresponds to an `external fun` declaration
//! in the app's `RustBridge` Kotlin object. Names follow JNI conventions:
//! Java_<package>_<class>_<method> with dots replaced by underscores.
//!
//! Results cross the boundary as JSON strings. Failures are returned as
//! `{"error": "..."}` rather than thrown.

use jni::objects::{JByteArray, JClass, JString};
use jni::sys::jstring;
use jni::JNIEnv;

fn error_json(message: &str) -> String {
    serde_json::json!({ "error": message }).to_string()
}

fn into_jstring(env: &mut JNIEnv, value: String) -> jstring {
    env.new_string(value)
        .expect("failed to create Java string")
        .into_raw()
}

/// Returns the library version.
/// Maps to: RustBridge.version() -> String
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_routeguide_app_RustBridge_version(
    mut env: JNIEnv,
    _class: JClass,
) -> jstring {
    into_jstring(&mut env, crate::VERSION.to_string())
}

/// Installs the Android logger. Safe to call more than once.
/// Maps to: RustBridge.init()
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_routeguide_app_RustBridge_init(_env: JNIEnv, _class: JClass) {
    crate::init_logging();
}

/// Generates navigation steps for a JSON path.
/// Maps to: RustBridge.generateSteps(pathJson: String) -> String
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_routeguide_app_RustBridge_generateSteps(
    mut env: JNIEnv,
    _class: JClass,
    path_json: JString,
) -> jstring {
    let output = match env.get_string(&path_json) {
        Ok(input) => {
            let input: String = input.into();
            crate::route_nav::steps_to_json(&input).unwrap_or_else(|e| error_json(&e.to_string()))
        }
        Err(e) => error_json(&format!("invalid string argument: {e}")),
    };
    into_jstring(&mut env, output)
}

/// Extracts the navigation path from GPX file contents.
/// Maps to: RustBridge.parseGpxPath(data: ByteArray) -> String
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_routeguide_app_RustBridge_parseGpxPath(
    mut env: JNIEnv,
    _class: JClass,
    data: JByteArray,
) -> jstring {
    let output = match env.convert_byte_array(&data) {
        Ok(bytes) => crate::gpx::path_to_json(&bytes).unwrap_or_else(|e| error_json(&e.to_string())),
        Err(e) => error_json(&format!("invalid byte array: {e}")),
    };
    into_jstring(&mut env, output)
}
