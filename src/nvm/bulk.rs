use crate::nvm::{
    NvmError,
    bus::BusArbiter,
    controller::NvmController,
    driver::BufferedNvm,
    helpers::page_offset,
    types::{Dest, Src},
};

impl<C, B, const PS: usize, const RS: usize> BufferedNvm<C, B, PS, RS>
where
    C: NvmController,
    B: BusArbiter,
{
    /// Copies `len` bytes from `src` to `dst` through the page buffer.
    ///
    /// Either side may be NVM or RAM, and NVM ranges may overlap in either direction.
    /// Stops at the first failure; steps already applied stay applied.
    pub fn memcpy_buffered(
        &mut self,
        mut dst: Dest<'_>,
        mut src: Src<'_>,
        len: usize,
    ) -> Result<(), NvmError> {
        if len == 0 {
            return Ok(());
        }
        self.check_endpoints(&dst, &src, len)?;

        if let (Dest::Nvm(to), Src::Nvm(from)) = (&dst, &src) {
            if *to > *from && *to - *from < len as u32 {
                return self.copy_backward(*to, *from, len);
            }
        }

        let mut remaining = len;
        while remaining > 0 {
            let moved = self.write_to_buffered_page(dst.reborrow(), src, remaining)?;
            dst = dst.advance(moved);
            src = src.advance(moved);
            remaining -= moved;
        }

        Ok(())
    }

    /// Sets `len` bytes at `dst` to `value` through the page buffer.
    pub fn memset_buffered(&mut self, dst: Dest<'_>, value: u8, len: usize) -> Result<(), NvmError> {
        self.memcpy_buffered(dst, Src::Fill(value), len)
    }

    /// Reads `out.len()` bytes starting at `addr`, seeing buffered writes that are not yet
    /// committed.
    pub fn read_buffered(&mut self, addr: u32, out: &mut [u8]) -> Result<(), NvmError> {
        let len = out.len();
        self.memcpy_buffered(Dest::Ram(out), Src::Nvm(addr), len)
    }

    fn check_endpoints(&self, dst: &Dest<'_>, src: &Src<'_>, len: usize) -> Result<(), NvmError> {
        match dst {
            Dest::Nvm(addr) => self.region.check_range(*addr, len)?,
            Dest::Ram(out) if out.len() < len => return Err(NvmError::OutOfBounds),
            Dest::Ram(_) => {}
        }
        match src {
            Src::Nvm(addr) => self.region.check_range(*addr, len)?,
            Src::Ram(data) if data.len() < len => return Err(NvmError::OutOfBounds),
            Src::Ram(_) | Src::Fill(_) => {}
        }
        Ok(())
    }

    /// Overlapping NVM copy towards higher addresses, moved tail first.
    ///
    /// Each chunk stays inside one destination page and one source page, so every step
    /// moves the whole chunk and no source byte is overwritten before it has been read.
    fn copy_backward(&mut self, dst: u32, src: u32, len: usize) -> Result<(), NvmError> {
        let mut remaining = len;
        while remaining > 0 {
            let dst_end = dst + remaining as u32;
            let src_end = src + remaining as u32;
            let chunk = remaining
                .min(page_offset::<PS>(dst_end - 1) + 1)
                .min(page_offset::<PS>(src_end - 1) + 1);

            let moved = self.write_to_buffered_page(
                Dest::Nvm(dst_end - chunk as u32),
                Src::Nvm(src_end - chunk as u32),
                chunk,
            )?;
            debug_assert_eq!(moved, chunk);
            remaining -= moved;
        }
        Ok(())
    }
}
