/// Calcula o checksum ICMP (complemento de um, RFC 792).
///
/// Os pares de bytes são somados como palavras "byte baixo + byte alto * 256";
/// um byte final ímpar entra sem deslocamento. O resultado sai com os bytes
/// trocados, ou seja, já é o valor em ordem de rede: `to_be_bytes()` dá os
/// dois bytes que vão no cabeçalho.
pub fn checksum(data: &[u8]) -> u16 {
    let mut sum: u32 = 0;
    let mut pairs = data.chunks_exact(2);
    for pair in &mut pairs {
        sum = sum.wrapping_add(u16::from_le_bytes([pair[0], pair[1]]) as u32);
    }
    if let Some(&last) = pairs.remainder().first() {
        sum = sum.wrapping_add(last as u32);
    }
    while (sum >> 16) != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    (!(sum as u16)).swap_bytes()
}

/// `true` quando o buffer (com o campo de checksum preenchido) soma zero.
pub fn is_valid(data: &[u8]) -> bool {
    checksum(data) == 0
}
