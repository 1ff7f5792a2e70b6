/// Flip packed pixel rows left-to-right in place.
///
/// `channels` is the number of bytes per pixel. Buffers whose length does
/// not match `width * height * channels` are left untouched and `false` is
/// returned.
pub fn mirror_horizontal(data: &mut [u8], width: u32, height: u32, channels: usize) -> bool {
    let row_len = width as usize * channels;
    if channels == 0 || data.len() != row_len * height as usize {
        return false;
    }
    if width < 2 {
        return true;
    }

    for row in data.chunks_exact_mut(row_len) {
        let (mut left, mut right) = (0usize, width as usize - 1);
        while left < right {
            for c in 0..channels {
                row.swap(left * channels + c, right * channels + c);
            }
            left += 1;
            right -= 1;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirrors_each_row_independently() {
        // 3x2 RGB: row 0 = A B C, row 1 = D E F
        let mut data = vec![
            1, 1, 1, 2, 2, 2, 3, 3, 3, //
            4, 4, 4, 5, 5, 5, 6, 6, 6,
        ];
        assert!(mirror_horizontal(&mut data, 3, 2, 3));
        assert_eq!(
            data,
            vec![
                3, 3, 3, 2, 2, 2, 1, 1, 1, //
                6, 6, 6, 5, 5, 5, 4, 4, 4,
            ]
        );
    }

    #[test]
    fn keeps_channel_order_within_pixel() {
        let mut data = vec![10, 20, 30, 40, 50, 60];
        mirror_horizontal(&mut data, 2, 1, 3);
        assert_eq!(data, vec![40, 50, 60, 10, 20, 30]);
    }

    #[test]
    fn mirroring_twice_is_identity() {
        let original: Vec<u8> = (0..(7 * 5 * 4)).map(|v| (v % 251) as u8).collect();
        let mut data = original.clone();
        mirror_horizontal(&mut data, 7, 5, 4);
        assert_ne!(data, original);
        mirror_horizontal(&mut data, 7, 5, 4);
        assert_eq!(data, original);
    }

    #[test]
    fn rejects_mismatched_buffer() {
        let mut data = vec![0u8; 10];
        assert!(!mirror_horizontal(&mut data, 2, 2, 3));
    }

    #[test]
    fn single_column_is_unchanged() {
        let mut data = vec![1, 2, 3, 4, 5, 6];
        assert!(mirror_horizontal(&mut data, 1, 2, 3));
        assert_eq!(data, vec![1, 2, 3, 4, 5, 6]);
    }
}
