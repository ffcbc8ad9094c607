// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Android platform bridge via JNI.
//
// Requires the Android NDK and targets `aarch64-linux-android` or
// `armv7-linux-androideabi`. USB enumeration goes through
// `android.hardware.usb.UsbManager`; Bluetooth through
// `android.bluetooth.BluetoothManager`. Permissions are only ever checked
// (`hasPermission`, `checkSelfPermission`), never requested.

#![cfg(target_os = "android")]

use jni::objects::{JObject, JObjectArray, JString, JValue};
use jni::{JNIEnv, JavaVM};
use std::sync::OnceLock;

use printscout_core::error::{Result, ScoutError};

use crate::jvm_call::{run_clean, PendingException};
use crate::traits::*;

// ---------------------------------------------------------------------------
// JNI bootstrap helpers
// ---------------------------------------------------------------------------

/// `Build.VERSION_CODES.S`: first API level with the BLUETOOTH_CONNECT gate.
const API_LEVEL_S: i32 = 31;

/// `PackageManager.PERMISSION_GRANTED`.
const PERMISSION_GRANTED: i32 = 0;

/// `BluetoothDevice.BOND_BONDING` / `BOND_BONDED`.
const BOND_BONDING: i32 = 11;
const BOND_BONDED: i32 = 12;

/// Local references a single bridge call is expected to need.
const LOCAL_FRAME_CAPACITY: i32 = 32;

/// Process-wide `JavaVM`, resolved once from the NDK glue.
static JAVA_VM: OnceLock<JavaVM> = OnceLock::new();

fn java_vm() -> Result<&'static JavaVM> {
    if let Some(vm) = JAVA_VM.get() {
        return Ok(vm);
    }
    let ctx = ndk_context::android_context();
    // SAFETY: `ctx.vm()` returns the `JavaVM*` set by the NDK glue code.
    // The pointer is guaranteed valid for the lifetime of the process.
    let vm = unsafe { JavaVM::from_raw(ctx.vm().cast()) }
        .map_err(|e| ScoutError::Bridge(format!("failed to obtain JavaVM: {e}")))?;
    Ok(JAVA_VM.get_or_init(|| vm))
}

/// Obtain a [`JNIEnv`] handle for the current thread.
///
/// The thread is attached permanently so the env stays valid for the
/// scanner's blocking-pool thread.
fn jni_env() -> Result<JNIEnv<'static>> {
    java_vm()?
        .attach_current_thread_permanently()
        .map_err(|e| ScoutError::Bridge(format!("failed to attach JNI thread: {e}")))
}

/// Obtain the application `Context` as a [`JObject`].
fn context() -> Result<JObject<'static>> {
    let ctx = ndk_context::android_context();
    let ptr = ctx.context();
    if ptr.is_null() {
        return Err(ScoutError::Bridge(
            "Android context is null; native activity not initialised".into(),
        ));
    }
    // SAFETY: the NDK guarantees this pointer is a valid global jobject for
    // the hosting Activity.
    Ok(unsafe { JObject::from_raw(ptr.cast()) })
}

impl PendingException for JNIEnv<'_> {
    fn exception_pending(&mut self) -> bool {
        self.exception_check().unwrap_or(false)
    }

    fn clear_exception(&mut self) {
        if let Err(e) = self.exception_clear() {
            tracing::warn!(error = %e, "Android: ExceptionClear failed");
        }
    }
}

/// Run one bridge call on the attached thread.
///
/// Local references created by `body` are released when its frame pops, so
/// repeated scans on a permanently attached thread do not grow the local
/// reference table.
fn jni_call<T>(what: &str, body: impl FnOnce(&mut JNIEnv<'_>) -> Result<T>) -> Result<T> {
    let mut env = jni_env()?;
    run_clean(&mut env, what, |env| {
        env.with_local_frame(LOCAL_FRAME_CAPACITY, |frame| -> jni::errors::Result<Result<T>> {
            Ok(body(frame))
        })
        .map_err(|e| jni_err(what, e))
        .and_then(|inner| inner)
    })
}

/// Convenience: map any `jni::errors::Error` into `ScoutError::Bridge`.
fn jni_err(context: &str, e: jni::errors::Error) -> ScoutError {
    ScoutError::Bridge(format!("{context}: {e}"))
}

/// `context.getSystemService(name)`; returns a null object when absent.
fn system_service<'a>(env: &mut JNIEnv<'a>, name: &str) -> Result<JObject<'a>> {
    let ctx = context()?;
    let j_name: JString = env
        .new_string(name)
        .map_err(|e| jni_err("new_string(service)", e))?;
    env.call_method(
        &ctx,
        "getSystemService",
        "(Ljava/lang/String;)Ljava/lang/Object;",
        &[JValue::Object(&j_name)],
    )
    .map_err(|e| jni_err("getSystemService", e))?
    .l()
    .map_err(|e| jni_err("getSystemService->l", e))
}

/// Read a nullable `java.lang.String` return value.
fn optional_string(env: &mut JNIEnv<'_>, obj: JObject<'_>) -> Result<Option<String>> {
    if obj.is_null() {
        return Ok(None);
    }
    let j_str = JString::from(obj);
    let value: String = env
        .get_string(&j_str)
        .map_err(|e| jni_err("get_string", e))?
        .into();
    Ok(Some(value))
}

fn call_int(env: &mut JNIEnv<'_>, obj: &JObject<'_>, method: &str) -> Result<i32> {
    env.call_method(obj, method, "()I", &[])
        .map_err(|e| jni_err(method, e))?
        .i()
        .map_err(|e| jni_err(method, e))
}

fn call_string(env: &mut JNIEnv<'_>, obj: &JObject<'_>, method: &str) -> Result<Option<String>> {
    let value = env
        .call_method(obj, method, "()Ljava/lang/String;", &[])
        .map_err(|e| jni_err(method, e))?
        .l()
        .map_err(|e| jni_err(method, e))?;
    optional_string(env, value)
}

/// `collection.toArray()` as a list of objects.
fn collection_items<'a>(env: &mut JNIEnv<'a>, collection: &JObject<'_>) -> Result<Vec<JObject<'a>>> {
    let array: JObjectArray = env
        .call_method(collection, "toArray", "()[Ljava/lang/Object;", &[])
        .map_err(|e| jni_err("toArray", e))?
        .l()
        .map_err(|e| jni_err("toArray->l", e))?
        .into();
    let len = env
        .get_array_length(&array)
        .map_err(|e| jni_err("get_array_length", e))?;
    let mut items = Vec::with_capacity(len as usize);
    for i in 0..len {
        items.push(
            env.get_object_array_element(&array, i)
                .map_err(|e| jni_err("get_object_array_element", e))?,
        );
    }
    Ok(items)
}

// ---------------------------------------------------------------------------
// Bridge struct
// ---------------------------------------------------------------------------

/// Android implementation of the printscout platform bridge.
///
/// Zero-sized; all state lives on the Java side and is re-read on every call.
pub struct AndroidBridge;

impl AndroidBridge {
    /// Create a new Android bridge.
    ///
    /// This does **not** touch JNI; the first JNI call happens lazily when
    /// a trait method is invoked.
    pub fn new() -> Self {
        Self
    }

    fn usb_manager<'a>(env: &mut JNIEnv<'a>) -> Result<JObject<'a>> {
        let manager = system_service(env, "usb")?;
        if manager.is_null() {
            return Err(ScoutError::TransportUnavailable {
                transport: "usb",
                reason: "UsbManager service missing".into(),
            });
        }
        Ok(manager)
    }

    /// `usbManager.getDeviceList().get(name)`.
    fn usb_device<'a>(
        env: &mut JNIEnv<'a>,
        manager: &JObject<'_>,
        device_name: &str,
    ) -> Result<JObject<'a>> {
        let map = env
            .call_method(manager, "getDeviceList", "()Ljava/util/HashMap;", &[])
            .map_err(|e| jni_err("getDeviceList", e))?
            .l()
            .map_err(|e| jni_err("getDeviceList->l", e))?;
        let key: JString = env
            .new_string(device_name)
            .map_err(|e| jni_err("new_string(device)", e))?;
        let device = env
            .call_method(
                &map,
                "get",
                "(Ljava/lang/Object;)Ljava/lang/Object;",
                &[JValue::Object(&key)],
            )
            .map_err(|e| jni_err("HashMap.get", e))?
            .l()
            .map_err(|e| jni_err("HashMap.get->l", e))?;
        if device.is_null() {
            return Err(ScoutError::inspection(device_name, "device detached"));
        }
        Ok(device)
    }

    /// `bluetoothManager.getAdapter()`, or `None` when there is no adapter.
    fn bluetooth_adapter<'a>(env: &mut JNIEnv<'a>) -> Result<Option<JObject<'a>>> {
        let manager = system_service(env, "bluetooth")?;
        if manager.is_null() {
            return Ok(None);
        }
        let adapter = env
            .call_method(
                &manager,
                "getAdapter",
                "()Landroid/bluetooth/BluetoothAdapter;",
                &[],
            )
            .map_err(|e| jni_err("getAdapter", e))?
            .l()
            .map_err(|e| jni_err("getAdapter->l", e))?;
        Ok((!adapter.is_null()).then_some(adapter))
    }

    fn sdk_int(env: &mut JNIEnv<'_>) -> Result<i32> {
        env.get_static_field("android/os/Build$VERSION", "SDK_INT", "I")
            .map_err(|e| jni_err("Build.VERSION.SDK_INT", e))?
            .i()
            .map_err(|e| jni_err("SDK_INT->i", e))
    }
}

impl Default for AndroidBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformBridge for AndroidBridge {
    fn platform_name(&self) -> &str {
        "Android"
    }
}

// ---------------------------------------------------------------------------
// UsbHost: android.hardware.usb.UsbManager
// ---------------------------------------------------------------------------

impl UsbHost for AndroidBridge {
    fn device_names(&self) -> Result<Vec<String>> {
        jni_call("UsbHost::device_names", |env| {
            let manager = Self::usb_manager(env)?;
            let map = env
                .call_method(&manager, "getDeviceList", "()Ljava/util/HashMap;", &[])
                .map_err(|e| ScoutError::TransportEnumeration {
                    transport: "usb",
                    reason: format!("getDeviceList: {e}"),
                })?
                .l()
                .map_err(|e| jni_err("getDeviceList->l", e))?;
            let keys = env
                .call_method(&map, "keySet", "()Ljava/util/Set;", &[])
                .map_err(|e| jni_err("keySet", e))?
                .l()
                .map_err(|e| jni_err("keySet->l", e))?;

            let mut names = Vec::new();
            for key in collection_items(env, &keys)? {
                if let Some(name) = optional_string(env, key)? {
                    names.push(name);
                }
            }
            tracing::debug!(count = names.len(), "Android: USB devices listed");
            Ok(names)
        })
    }

    fn describe_device(&self, device_name: &str) -> Result<UsbDeviceInfo> {
        jni_call("UsbHost::describe_device", |env| {
            let manager = Self::usb_manager(env)?;
            let device = Self::usb_device(env, &manager, device_name)?;
            let inspect = |e: ScoutError| ScoutError::inspection(device_name, e);

            let vendor_id = call_int(env, &device, "getVendorId").map_err(inspect)?;
            let product_id = call_int(env, &device, "getProductId").map_err(inspect)?;
            let device_class = call_int(env, &device, "getDeviceClass").map_err(inspect)?;
            let interface_count = call_int(env, &device, "getInterfaceCount").map_err(inspect)?;

            let mut interface_classes = Vec::with_capacity(interface_count.max(0) as usize);
            for i in 0..interface_count {
                let interface = env
                    .call_method(
                        &device,
                        "getInterface",
                        "(I)Landroid/hardware/usb/UsbInterface;",
                        &[JValue::Int(i)],
                    )
                    .and_then(|v| v.l())
                    .map_err(|e| ScoutError::inspection(device_name, e))?;
                let class = call_int(env, &interface, "getInterfaceClass").map_err(inspect)?;
                interface_classes.push(class as u8);
                env.delete_local_ref(interface)
                    .map_err(|e| jni_err("delete_local_ref(interface)", e))?;
            }

            let product_name = call_string(env, &device, "getProductName").map_err(inspect)?;
            let manufacturer_name =
                call_string(env, &device, "getManufacturerName").map_err(inspect)?;

            Ok(UsbDeviceInfo {
                device_name: device_name.to_owned(),
                vendor_id: vendor_id as u16,
                product_id: product_id as u16,
                device_class: device_class as u8,
                interface_classes,
                product_name,
                manufacturer_name,
            })
        })
    }

    fn has_permission(&self, device_name: &str) -> Result<bool> {
        jni_call("UsbHost::has_permission", |env| {
            let manager = Self::usb_manager(env)?;
            let device = Self::usb_device(env, &manager, device_name)?;
            env.call_method(
                &manager,
                "hasPermission",
                "(Landroid/hardware/usb/UsbDevice;)Z",
                &[JValue::Object(&device)],
            )
            .and_then(|v| v.z())
            .map_err(|e| ScoutError::inspection(device_name, e))
        })
    }
}

// ---------------------------------------------------------------------------
// BluetoothHost: android.bluetooth.BluetoothAdapter
// ---------------------------------------------------------------------------

impl BluetoothHost for AndroidBridge {
    fn adapter_state(&self) -> Result<AdapterState> {
        jni_call("BluetoothHost::adapter_state", |env| {
            let Some(adapter) = Self::bluetooth_adapter(env)? else {
                return Ok(AdapterState::Missing);
            };
            let enabled = env
                .call_method(&adapter, "isEnabled", "()Z", &[])
                .and_then(|v| v.z())
                .map_err(|e| jni_err("isEnabled", e))?;
            Ok(if enabled {
                AdapterState::PoweredOn
            } else {
                AdapterState::PoweredOff
            })
        })
    }

    fn connect_permission(&self) -> PermissionState {
        let checked = jni_call("BluetoothHost::connect_permission", |env| {
            if Self::sdk_int(env)? < API_LEVEL_S {
                return Ok(PermissionState::NotRequired);
            }
            let ctx = context()?;
            let j_perm: JString = env
                .new_string(BLUETOOTH_CONNECT_PERMISSION)
                .map_err(|e| jni_err("new_string(permission)", e))?;
            let result = env
                .call_method(
                    &ctx,
                    "checkSelfPermission",
                    "(Ljava/lang/String;)I",
                    &[JValue::Object(&j_perm)],
                )
                .and_then(|v| v.i())
                .map_err(|e| jni_err("checkSelfPermission", e))?;
            Ok(if result == PERMISSION_GRANTED {
                PermissionState::Granted
            } else {
                PermissionState::Denied
            })
        });
        checked.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Android: permission check failed, treating as denied");
            PermissionState::Denied
        })
    }

    fn bonded_addresses(&self) -> Result<Vec<String>> {
        jni_call("BluetoothHost::bonded_addresses", |env| {
            let adapter = Self::bluetooth_adapter(env)?.ok_or(ScoutError::TransportUnavailable {
                transport: "bluetooth",
                reason: "no adapter".into(),
            })?;
            let bonded = env
                .call_method(&adapter, "getBondedDevices", "()Ljava/util/Set;", &[])
                .and_then(|v| v.l())
                .map_err(|e| ScoutError::TransportEnumeration {
                    transport: "bluetooth",
                    reason: format!("getBondedDevices: {e}"),
                })?;
            if bonded.is_null() {
                return Ok(Vec::new());
            }

            let mut addresses = Vec::new();
            for device in collection_items(env, &bonded)? {
                if let Some(address) = call_string(env, &device, "getAddress")? {
                    addresses.push(address);
                }
                env.delete_local_ref(device)
                    .map_err(|e| jni_err("delete_local_ref(device)", e))?;
            }
            Ok(addresses)
        })
    }

    fn describe_bonded(&self, address: &str) -> Result<BondedDevice> {
        jni_call("BluetoothHost::describe_bonded", |env| {
            let adapter = Self::bluetooth_adapter(env)?.ok_or(ScoutError::TransportUnavailable {
                transport: "bluetooth",
                reason: "no adapter".into(),
            })?;
            let inspect = |e: ScoutError| ScoutError::inspection(address, e);

            let j_address: JString = env
                .new_string(address)
                .map_err(|e| jni_err("new_string(address)", e))?;
            let device = env
                .call_method(
                    &adapter,
                    "getRemoteDevice",
                    "(Ljava/lang/String;)Landroid/bluetooth/BluetoothDevice;",
                    &[JValue::Object(&j_address)],
                )
                .and_then(|v| v.l())
                .map_err(|e| ScoutError::inspection(address, e))?;

            let name = call_string(env, &device, "getName").map_err(inspect)?;
            let class_obj = env
                .call_method(
                    &device,
                    "getBluetoothClass",
                    "()Landroid/bluetooth/BluetoothClass;",
                    &[],
                )
                .and_then(|v| v.l())
                .map_err(|e| ScoutError::inspection(address, e))?;
            let device_class = if class_obj.is_null() {
                None
            } else {
                Some(call_int(env, &class_obj, "getDeviceClass").map_err(inspect)? as u32)
            };
            let bond_state = match call_int(env, &device, "getBondState").map_err(inspect)? {
                BOND_BONDED => BondState::Bonded,
                BOND_BONDING => BondState::Bonding,
                _ => BondState::None,
            };

            Ok(BondedDevice {
                address: address.to_owned(),
                name,
                device_class,
                bond_state,
            })
        })
    }
}

// ---------------------------------------------------------------------------
// Serial ports and print queues
// ---------------------------------------------------------------------------

// USB-to-serial adapters show up through `UsbManager` on Android; there is no
// separate serial or spooler API to read.

impl SerialHost for AndroidBridge {
    fn serial_ports(&self) -> Result<Vec<SerialPortInfo>> {
        Err(ScoutError::TransportUnavailable {
            transport: "serial",
            reason: "Android exposes serial adapters as USB devices".into(),
        })
    }
}

impl PrintQueueHost for AndroidBridge {
    fn printer_queues(&self) -> Result<Vec<PrinterQueue>> {
        Err(ScoutError::TransportUnavailable {
            transport: "system",
            reason: "no OS print queues on Android".into(),
        })
    }
}
