// src/tests/common.rs

//! Common test fixtures: accounting records serialized from in-memory
//! `#[repr(C)]` values, and temporary files holding them.

#![allow(non_snake_case)]

use crate::common::{FPath, FileSz};
use crate::data::datetime::{
    ymdhms,
    ymdhmsm,
    DateTimeL,
    FixedOffset,
};
use crate::data::utent::{linux_gnu, openbsd_x86};
use crate::debug::helpers::{
    create_temp_file_bytes,
    ntf_fpath,
    NamedTempFile,
};

use std::mem::size_of;

use ::lazy_static::lazy_static;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// record builders
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// copy `src` into the fixed-width C character field `dst`; bytes past
/// `src` stay NUL; bytes past the field capacity are dropped
pub fn copy_str_to_cchar(
    dst: &mut [std::ffi::c_char],
    src: &str,
) {
    for (i, b) in src.bytes().enumerate() {
        if i >= dst.len() {
            break;
        }
        dst[i] = b as std::ffi::c_char;
    }
}

/// view a `#[repr(C)]` record as its raw on-disk bytes
pub fn raw_bytes<T: Copy>(entry: &T) -> Vec<u8> {
    let ptr = (entry as *const T) as *const u8;
    unsafe { std::slice::from_raw_parts(ptr, size_of::<T>()) }.to_vec()
}

/// build a [`linux_gnu::utmpx`] record; unlisted fields are zero
///
/// starts from all-zero memory so the struct's padding bytes are
/// deterministic when the record is serialized with [`raw_bytes`]
#[allow(clippy::too_many_arguments)]
pub fn utmpx_linux_gnu(
    ut_type: linux_gnu::c_short,
    ut_pid: linux_gnu::pid_t,
    line: &str,
    id: &str,
    user: &str,
    host: &str,
    tv_sec: i32,
    tv_usec: i32,
) -> linux_gnu::utmpx {
    // all-zero bytes are a valid `utmpx` value
    let mut entry: linux_gnu::utmpx = unsafe { std::mem::zeroed() };
    entry.ut_type = ut_type;
    entry.ut_pid = ut_pid;
    entry.ut_tv = linux_gnu::__timeval { tv_sec, tv_usec };
    copy_str_to_cchar(&mut entry.ut_line, line);
    copy_str_to_cchar(&mut entry.ut_id, id);
    copy_str_to_cchar(&mut entry.ut_user, user);
    copy_str_to_cchar(&mut entry.ut_host, host);

    entry
}

/// build an [`openbsd_x86::utmp`] record
pub fn utmp_openbsd(
    line: &str,
    name: &str,
    host: &str,
    ut_time: openbsd_x86::time_t,
) -> openbsd_x86::utmp {
    // all-zero bytes are a valid `utmp` value
    let mut entry: openbsd_x86::utmp = unsafe { std::mem::zeroed() };
    entry.ut_time = ut_time;
    copy_str_to_cchar(&mut entry.ut_line, line);
    copy_str_to_cchar(&mut entry.ut_name, name);
    copy_str_to_cchar(&mut entry.ut_host, host);

    entry
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// fixtures
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// 2020-01-01T12:00:00Z
pub const TV_SEC_1: i32 = 1577880000;
/// 2020-01-01T12:00:01Z
pub const TV_SEC_2: i32 = 1577880001;
/// 2020-01-01T12:00:02Z
pub const TV_SEC_3: i32 = 1577880002;
pub const TV_USEC_3: i32 = 123636;

/// 2023-11-14T22:13:20Z
pub const TV_SEC_CAROL: openbsd_x86::time_t = 1700000000;

pub const UTENT_3ENTRY_FILESZ: FileSz = (linux_gnu::UTMPX_SZ * 3) as FileSz;

lazy_static! {
    /// a `FixedOffset` at UTC
    pub static ref FO_0: FixedOffset = FixedOffset::east_opt(0).unwrap();
    /// a `FixedOffset` at UTC+8
    pub static ref FO_P8: FixedOffset = FixedOffset::east_opt(8 * 3600).unwrap();

    pub static ref UTENT_ALICE: linux_gnu::utmpx = utmpx_linux_gnu(
        linux_gnu::USER_PROCESS,
        41908,
        "pts/0",
        "ts/0",
        "alice",
        "192.168.1.4",
        TV_SEC_1,
        0,
    );
    pub static ref UTENT_BOOT: linux_gnu::utmpx = utmpx_linux_gnu(
        linux_gnu::BOOT_TIME,
        1,
        "~",
        "~~",
        "reboot",
        "5.15.0-76-generic",
        TV_SEC_2,
        0,
    );
    pub static ref UTENT_BOB: linux_gnu::utmpx = utmpx_linux_gnu(
        linux_gnu::DEAD_PROCESS,
        13236,
        "pts/1",
        "ts/1",
        "bob",
        "",
        TV_SEC_3,
        TV_USEC_3,
    );
    pub static ref UTENT_CAROL_OPENBSD: openbsd_x86::utmp = utmp_openbsd(
        "ttyC0",
        "carol",
        "gateway.example.com",
        TV_SEC_CAROL,
    );

    pub static ref UTENT_BUFFER_ALICE: Vec<u8> = raw_bytes(&*UTENT_ALICE);
    pub static ref UTENT_BUFFER_BOOT: Vec<u8> = raw_bytes(&*UTENT_BOOT);
    pub static ref UTENT_BUFFER_BOB: Vec<u8> = raw_bytes(&*UTENT_BOB);
    pub static ref UTENT_BUFFER_CAROL: Vec<u8> = raw_bytes(&*UTENT_CAROL_OPENBSD);

    /// alice, reboot, bob, in file order
    pub static ref UTENT_3ENTRY_BYTES: Vec<u8> = {
        let mut bytes = Vec::<u8>::with_capacity(UTENT_3ENTRY_FILESZ as usize);
        bytes.extend_from_slice(&UTENT_BUFFER_ALICE);
        bytes.extend_from_slice(&UTENT_BUFFER_BOOT);
        bytes.extend_from_slice(&UTENT_BUFFER_BOB);
        bytes
    };

    /// datetime of `UTENT_ALICE`
    pub static ref UTENT_DT_1: DateTimeL = ymdhms(&FO_0, 2020, 1, 1, 12, 0, 0);
    /// datetime of `UTENT_BOB`
    pub static ref UTENT_DT_3: DateTimeL = ymdhmsm(&FO_0, 2020, 1, 1, 12, 0, 2, 123636);

    // BUG: `NamedTempFile` created within `lazy_static` will fail to remove itself
    //      <https://github.com/Stebalien/tempfile/issues/183>.

    pub static ref NTF_UTENT_EMPTY: NamedTempFile = create_temp_file_bytes(&[]);
    pub static ref NTF_UTENT_EMPTY_FPATH: FPath = ntf_fpath(&NTF_UTENT_EMPTY);

    pub static ref NTF_UTENT_3ENTRY: NamedTempFile =
        create_temp_file_bytes(&UTENT_3ENTRY_BYTES);
    pub static ref NTF_UTENT_3ENTRY_FPATH: FPath = ntf_fpath(&NTF_UTENT_3ENTRY);

    /// only the entry for bob
    pub static ref NTF_UTENT_BOB_ONLY: NamedTempFile =
        create_temp_file_bytes(&UTENT_BUFFER_BOB);
    pub static ref NTF_UTENT_BOB_ONLY_FPATH: FPath = ntf_fpath(&NTF_UTENT_BOB_ONLY);

    /// 10 bytes; a record truncated near its beginning
    pub static ref NTF_UTENT_PARTIAL: NamedTempFile =
        create_temp_file_bytes(&UTENT_BUFFER_ALICE[..10]);
    pub static ref NTF_UTENT_PARTIAL_FPATH: FPath = ntf_fpath(&NTF_UTENT_PARTIAL);

    /// one whole record then 10 bytes of a second record
    pub static ref NTF_UTENT_1ENTRY_TRUNCATED: NamedTempFile = {
        let mut bytes = Vec::<u8>::with_capacity(linux_gnu::UTMPX_SZ + 10);
        bytes.extend_from_slice(&UTENT_BUFFER_ALICE);
        bytes.extend_from_slice(&UTENT_BUFFER_BOOT[..10]);
        create_temp_file_bytes(&bytes)
    };
    pub static ref NTF_UTENT_1ENTRY_TRUNCATED_FPATH: FPath =
        ntf_fpath(&NTF_UTENT_1ENTRY_TRUNCATED);
}
