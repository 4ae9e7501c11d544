//! Windows device enumeration through the setup API
//!
//! Interfaces come from `SetupDiEnumDeviceInterfaces`; each one is opened with
//! `CreateFileW` and queried with `DeviceIoControl`.

use std::ffi::c_void;
use std::mem::size_of;

use windows::core::{Error as WinError, GUID, PCWSTR};
use windows::Win32::Devices::DeviceAndDriverInstallation::{
    SetupDiDestroyDeviceInfoList, SetupDiEnumDeviceInterfaces, SetupDiGetClassDevsW,
    SetupDiGetDeviceInterfaceDetailW, DIGCF_DEVICEINTERFACE, DIGCF_PRESENT, HDEVINFO,
    SP_DEVICE_INTERFACE_DATA, SP_DEVICE_INTERFACE_DETAIL_DATA_W,
};
use windows::Win32::Foundation::{
    CloseHandle, ERROR_INSUFFICIENT_BUFFER, ERROR_MORE_DATA, ERROR_NO_MORE_ITEMS, GENERIC_READ,
    HANDLE, WIN32_ERROR,
};
use windows::Win32::Storage::FileSystem::{
    CreateFileW, FILE_ATTRIBUTE_NORMAL, FILE_SHARE_READ, FILE_SHARE_WRITE, OPEN_EXISTING,
};
use windows::Win32::System::Ioctl::{
    IOCTL_DISK_GET_DRIVE_LAYOUT_EX, IOCTL_STORAGE_GET_DEVICE_NUMBER,
};
use windows::Win32::System::IO::DeviceIoControl;

use crate::config::DeviceClass;
use crate::disk::device::{Device, DeviceNumber, IoctlOutcome};
use crate::disk::enumerate::{DeviceEnumerator, Devices};
use crate::disk::query::{query_with_growth, GrowthPolicy};
use crate::error::{FindfsError, Result};

/// Longest interface detail record accepted
const MAX_INTERFACE_DETAIL_BYTES: usize = 64 * 1024;

/// Offset of `DevicePath` in `SP_DEVICE_INTERFACE_DETAIL_DATA_W`
const DEVICE_PATH_OFFSET: usize = size_of::<u32>();

fn os_error<S: Into<String>>(operation: S, err: &WinError) -> FindfsError {
    FindfsError::os(operation, err.message().to_string().trim_end())
}

fn is_code(err: &WinError, code: WIN32_ERROR) -> bool {
    err.code() == code.to_hresult()
}

/// Enumerator backed by the Windows setup API
#[derive(Debug, Default)]
pub struct SetupApiEnumerator;

impl SetupApiEnumerator {
    /// Create the enumerator
    pub fn new() -> Self {
        Self
    }
}

impl DeviceEnumerator for SetupApiEnumerator {
    fn enumerate(&self, class: DeviceClass) -> Result<Devices<'_>> {
        let class_guid = GUID::from_u128(class.interface_guid());

        let info_set = unsafe {
            SetupDiGetClassDevsW(
                Some(&class_guid as *const GUID),
                PCWSTR::null(),
                None,
                DIGCF_PRESENT | DIGCF_DEVICEINTERFACE,
            )
        }
        .map_err(|e| {
            FindfsError::EnumerationUnavailable(os_error("SetupDiGetClassDevs", &e).to_string())
        })?;

        log::debug!("Enumerating {} interfaces", class);
        Ok(Box::new(DeviceInterfaces {
            info_set: DeviceInfoSet(info_set),
            class_guid,
            index: 0,
            done: false,
        }))
    }
}

/// Owned device information set
struct DeviceInfoSet(HDEVINFO);

impl Drop for DeviceInfoSet {
    fn drop(&mut self) {
        unsafe {
            let _ = SetupDiDestroyDeviceInfoList(self.0);
        }
    }
}

/// Iterator over the interfaces of one class
struct DeviceInterfaces {
    info_set: DeviceInfoSet,
    class_guid: GUID,
    index: u32,
    done: bool,
}

impl DeviceInterfaces {
    /// Read the device path of an interface; the record size is only known to the OS
    fn interface_path(&self, data: &SP_DEVICE_INTERFACE_DATA) -> Result<String> {
        let header = size_of::<SP_DEVICE_INTERFACE_DETAIL_DATA_W>();
        let policy = GrowthPolicy::new(0, size_of::<u16>(), MAX_INTERFACE_DETAIL_BYTES);

        let output = query_with_growth(&policy, "SetupDiGetDeviceInterfaceDetail", |buffer| {
            let mut required = 0u32;
            let (detail, size) = if buffer.len() >= header {
                buffer[..4].copy_from_slice(&(header as u32).to_ne_bytes());
                (
                    Some(buffer.as_mut_ptr().cast::<SP_DEVICE_INTERFACE_DETAIL_DATA_W>()),
                    buffer.len() as u32,
                )
            } else {
                (None, 0)
            };

            let result = unsafe {
                SetupDiGetDeviceInterfaceDetailW(
                    self.info_set.0,
                    data as *const SP_DEVICE_INTERFACE_DATA,
                    detail,
                    size,
                    Some(&mut required as *mut u32),
                    None,
                )
            };

            match result {
                Ok(()) => Ok(IoctlOutcome::Complete(buffer.len())),
                Err(e) if is_code(&e, ERROR_INSUFFICIENT_BUFFER) => Ok(
                    IoctlOutcome::InsufficientBuffer(Some((required as usize).max(header))),
                ),
                Err(e) => Err(os_error("SetupDiGetDeviceInterfaceDetail", &e)),
            }
        })?;

        let units: Vec<u16> = output
            .bytes
            .get(DEVICE_PATH_OFFSET..)
            .unwrap_or_default()
            .chunks_exact(2)
            .map(|pair| u16::from_ne_bytes([pair[0], pair[1]]))
            .take_while(|&unit| unit != 0)
            .collect();
        Ok(String::from_utf16_lossy(&units))
    }
}

impl Iterator for DeviceInterfaces {
    type Item = Box<dyn Device>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let mut data = SP_DEVICE_INTERFACE_DATA {
                cbSize: size_of::<SP_DEVICE_INTERFACE_DATA>() as u32,
                ..Default::default()
            };
            let member = self.index;
            self.index += 1;

            let result = unsafe {
                SetupDiEnumDeviceInterfaces(
                    self.info_set.0,
                    None,
                    &self.class_guid as *const GUID,
                    member,
                    &mut data as *mut SP_DEVICE_INTERFACE_DATA,
                )
            };
            if let Err(e) = result {
                self.done = true;
                if !is_code(&e, ERROR_NO_MORE_ITEMS) {
                    log::error!("{}", os_error("SetupDiEnumDeviceInterfaces", &e));
                }
                break;
            }

            let path = match self.interface_path(&data) {
                Ok(path) => path,
                Err(e) => {
                    log::warn!("Skipping interface {}: {}", member, e);
                    continue;
                }
            };

            match DiskHandle::open(path) {
                Ok(device) => return Some(Box::new(device)),
                Err(e) => log::warn!("{}", e),
            }
        }

        None
    }
}

/// Read-only handle to one device interface
struct DiskHandle {
    handle: HANDLE,
    path: String,
}

impl DiskHandle {
    fn open(path: String) -> Result<Self> {
        let wide: Vec<u16> = path.encode_utf16().chain(std::iter::once(0)).collect();

        let handle = unsafe {
            CreateFileW(
                PCWSTR(wide.as_ptr()),
                GENERIC_READ.0,
                FILE_SHARE_READ | FILE_SHARE_WRITE,
                None,
                OPEN_EXISTING,
                FILE_ATTRIBUTE_NORMAL,
                None,
            )
        }
        .map_err(|e| os_error(format!("CreateFile({})", path), &e))?;

        log::debug!("Opened {}", path);
        Ok(Self { handle, path })
    }
}

impl Device for DiskHandle {
    fn path(&self) -> &str {
        &self.path
    }

    fn drive_layout(&self, buffer: &mut [u8]) -> Result<IoctlOutcome> {
        let mut returned = 0u32;

        let result = unsafe {
            DeviceIoControl(
                self.handle,
                IOCTL_DISK_GET_DRIVE_LAYOUT_EX,
                None,
                0,
                Some(buffer.as_mut_ptr().cast::<c_void>()),
                buffer.len() as u32,
                Some(&mut returned as *mut u32),
                None,
            )
        };

        match result {
            Ok(()) => Ok(IoctlOutcome::Complete(returned as usize)),
            // the reply carries no size hint
            Err(e) if is_code(&e, ERROR_INSUFFICIENT_BUFFER) || is_code(&e, ERROR_MORE_DATA) => {
                Ok(IoctlOutcome::InsufficientBuffer(None))
            }
            Err(e) => Err(os_error("IOCTL_DISK_GET_DRIVE_LAYOUT_EX", &e)),
        }
    }

    fn device_number(&self) -> Result<DeviceNumber> {
        // STORAGE_DEVICE_NUMBER: DeviceType, DeviceNumber, PartitionNumber
        let mut raw = [0u32; 3];
        let mut returned = 0u32;

        unsafe {
            DeviceIoControl(
                self.handle,
                IOCTL_STORAGE_GET_DEVICE_NUMBER,
                None,
                0,
                Some(raw.as_mut_ptr().cast::<c_void>()),
                std::mem::size_of_val(&raw) as u32,
                Some(&mut returned as *mut u32),
                None,
            )
        }
        .map_err(|e| os_error("IOCTL_STORAGE_GET_DEVICE_NUMBER", &e))?;

        Ok(DeviceNumber {
            device_type: raw[0],
            device_number: raw[1],
            partition_number: raw[2],
        })
    }
}

impl Drop for DiskHandle {
    fn drop(&mut self) {
        unsafe {
            let _ = CloseHandle(self.handle);
        }
    }
}
