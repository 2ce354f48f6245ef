/// Builds a device control code from its four fields.
pub const fn ctl_code(device_type: u32, function: u32, method: u32, access: u32) -> u32 {
    (device_type << 16) | (access << 14) | (function << 2) | method
}

/// Device type shared with user-mode callers.
pub const FILE_DEVICE_USBOTP: u32 = 40001;
/// Input and output travel through a single system buffer.
pub const METHOD_BUFFERED: u32 = 0;
pub const FILE_ANY_ACCESS: u32 = 0;

/// OTP validation request (`0x9C41_2400`).
pub const IOCTL_USBOTP_VALIDATE_OTP: u32 =
    ctl_code(FILE_DEVICE_USBOTP, 0x900, METHOD_BUFFERED, FILE_ANY_ACCESS);
