#![no_std]

use dot15d4_tal as _;
