//! Device configuration persisted in the last sector of the data partition.
//!
//! The record format itself lives in `wordly_core::config::record`; this
//! module only does the flash IO. All transfers are word-aligned: the record
//! is a whole number of words and the partition table reader works in aligned
//! blocks.

use embedded_storage::{ReadStorage, Storage};
use esp_bootloader_esp_idf::partitions::{
    DataPartitionSubType, PARTITION_TABLE_MAX_LEN, PartitionType, read_partition_table,
};
use esp_rom_sys::rom::spiflash::{
    ESP_ROM_SPIFLASH_RESULT_OK, esp_rom_spiflash_erase_sector, esp_rom_spiflash_read,
    esp_rom_spiflash_unlock, esp_rom_spiflash_write,
};
use wordly_core::config::record::{self, RECORD_LEN, RecordError};
use wordly_core::config::{ConfigStore, DeviceConfig};

const FLASH_SECTOR_SIZE: u32 = 4096;
const DEFAULT_FLASH_CAPACITY_BYTES: usize = 16 * 1024 * 1024;
const WORD_BYTES: u32 = 4;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum FlashConfigError {
    PartitionTable,
    ConfigPartitionMissing,
    FlashOpFailed(i32),
    Corrupted,
    Unaligned,
}

fn check_rom_result(rc: i32) -> Result<(), FlashConfigError> {
    if rc == ESP_ROM_SPIFLASH_RESULT_OK {
        Ok(())
    } else {
        Err(FlashConfigError::FlashOpFailed(rc))
    }
}

/// Word-granular access to SPI flash through the ROM routines.
#[derive(Debug)]
struct RawFlash;

impl RawFlash {
    fn new() -> Result<Self, FlashConfigError> {
        check_rom_result(unsafe { esp_rom_spiflash_unlock() })?;
        Ok(Self)
    }

    fn erase_sector(&mut self, sector_addr: u32) -> Result<(), FlashConfigError> {
        if !sector_addr.is_multiple_of(FLASH_SECTOR_SIZE) {
            return Err(FlashConfigError::Unaligned);
        }
        check_rom_result(unsafe { esp_rom_spiflash_erase_sector(sector_addr / FLASH_SECTOR_SIZE) })
    }

    fn read_words(&mut self, addr: u32, out: &mut [u8]) -> Result<(), FlashConfigError> {
        if !addr.is_multiple_of(WORD_BYTES) || !out.len().is_multiple_of(WORD_BYTES as usize) {
            return Err(FlashConfigError::Unaligned);
        }
        for (i, chunk) in out.chunks_exact_mut(WORD_BYTES as usize).enumerate() {
            let mut word = 0u32;
            let rc = unsafe {
                esp_rom_spiflash_read(
                    addr + i as u32 * WORD_BYTES,
                    &mut word as *mut u32 as *const u32,
                    WORD_BYTES,
                )
            };
            check_rom_result(rc)?;
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        Ok(())
    }

    /// Programs previously erased words; flash bits only go from 1 to 0.
    fn write_erased_words(&mut self, addr: u32, data: &[u8]) -> Result<(), FlashConfigError> {
        if !addr.is_multiple_of(WORD_BYTES) || !data.len().is_multiple_of(WORD_BYTES as usize) {
            return Err(FlashConfigError::Unaligned);
        }
        for (i, chunk) in data.chunks_exact(WORD_BYTES as usize).enumerate() {
            let word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            let rc = unsafe {
                esp_rom_spiflash_write(addr + i as u32 * WORD_BYTES, &word as *const u32, WORD_BYTES)
            };
            check_rom_result(rc)?;
        }
        Ok(())
    }
}

impl ReadStorage for RawFlash {
    type Error = FlashConfigError;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        self.read_words(offset, bytes)
    }

    fn capacity(&self) -> usize {
        DEFAULT_FLASH_CAPACITY_BYTES
    }
}

impl Storage for RawFlash {
    /// Whole-sector writes only; the sector is erased first.
    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        if bytes.len() as u32 > FLASH_SECTOR_SIZE {
            return Err(FlashConfigError::Unaligned);
        }
        self.erase_sector(offset)?;
        self.write_erased_words(offset, bytes)
    }
}

#[derive(Debug)]
pub struct FlashConfigStore {
    flash: RawFlash,
    config_sector_addr: u32,
}

impl FlashConfigStore {
    /// Locates the config sector: the last sector of the first writable
    /// data/undefined partition, falling back to the NVS partition.
    pub fn new() -> Result<Self, FlashConfigError> {
        let mut flash = RawFlash::new()?;

        let mut table_buf = [0u8; PARTITION_TABLE_MAX_LEN];
        let table = read_partition_table(&mut flash, &mut table_buf)
            .map_err(|_| FlashConfigError::PartitionTable)?;

        let mut nvs: Option<(u32, u32)> = None;
        let mut home = None;
        for entry in table.iter() {
            if entry.is_read_only() || entry.len() < FLASH_SECTOR_SIZE {
                continue;
            }
            match entry.partition_type() {
                PartitionType::Data(DataPartitionSubType::Undefined) => {
                    home = Some((entry.offset(), entry.len()));
                    break;
                }
                PartitionType::Data(DataPartitionSubType::Nvs) if nvs.is_none() => {
                    nvs = Some((entry.offset(), entry.len()));
                }
                _ => {}
            }
        }

        let (offset, len) = home.or(nvs).ok_or(FlashConfigError::ConfigPartitionMissing)?;
        Ok(Self {
            flash,
            config_sector_addr: offset + len - FLASH_SECTOR_SIZE,
        })
    }
}

impl ConfigStore for FlashConfigStore {
    type Error = FlashConfigError;

    fn load(&mut self) -> Result<Option<DeviceConfig>, Self::Error> {
        let mut buf = [0u8; RECORD_LEN];
        self.flash.read_words(self.config_sector_addr, &mut buf)?;

        match record::parse(&buf) {
            Ok(config) => Ok(config),
            Err(RecordError::Corrupted) => Err(FlashConfigError::Corrupted),
        }
    }

    fn save(&mut self, config: &DeviceConfig) -> Result<(), Self::Error> {
        let buf = record::encode(config);
        self.flash.write(self.config_sector_addr, &buf)
    }
}
