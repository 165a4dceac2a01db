use affinidi_elliptic::{
    CipherContext, CryptoError, SecretBuffer, ciphers,
    symmetric::{self, decrypt, encrypt, generate_iv},
};
use tracing_subscriber::filter;

fn init_logging() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter::EnvFilter::from_default_env())
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[test]
fn round_trip_every_available_cipher() {
    init_logging();

    for spec in ciphers::available() {
        let key = SecretBuffer::random(spec.key_size()).unwrap();
        let iv = generate_iv(&spec).unwrap();
        let bs = spec.block_size();

        for len in [0, 1, bs - 1, bs, 10 * bs] {
            let plaintext: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
            let ciphertext = encrypt(spec, key.as_bytes(), &iv, &plaintext).unwrap();
            if spec.algorithm().is_padded() {
                assert_eq!(ciphertext.len(), (len / bs + 1) * bs, "{spec}");
            } else {
                assert_eq!(ciphertext.len(), len, "{spec}");
            }
            if len >= 4 {
                assert_ne!(ciphertext[..len], plaintext[..], "{spec}");
            }

            let decrypted = decrypt(spec, key.as_bytes(), &iv, &ciphertext).unwrap();
            assert_eq!(decrypted, plaintext, "{spec} len={len}");
        }
    }
}

#[test]
fn streaming_with_uneven_chunks() {
    init_logging();

    let plaintext: Vec<u8> = (0..333u16).map(|i| i as u8).collect();
    for spec in ciphers::available() {
        let key = SecretBuffer::random(spec.key_size()).unwrap();
        let iv = generate_iv(&spec).unwrap();

        let mut encryptor = CipherContext::encryptor(spec, key.as_bytes(), &iv).unwrap();
        let mut ciphertext = Vec::new();
        for chunk in plaintext.chunks(13) {
            ciphertext.extend(encryptor.update(chunk).unwrap());
        }
        ciphertext.extend(encryptor.finalize().unwrap());
        assert_eq!(
            ciphertext,
            encrypt(spec, key.as_bytes(), &iv, &plaintext).unwrap(),
            "{spec}"
        );

        let mut decryptor = CipherContext::decryptor(spec, key.as_bytes(), &iv).unwrap();
        let mut decrypted = Vec::new();
        for chunk in ciphertext.chunks(5) {
            decrypted.extend(decryptor.update(chunk).unwrap());
        }
        decrypted.extend(decryptor.finalize().unwrap());
        assert_eq!(decrypted, plaintext, "{spec}");

        assert!(matches!(
            decryptor.update(b"more"),
            Err(CryptoError::ContextReused)
        ));
    }
}

#[test]
fn padded_cipher_rejects_corrupt_padding() {
    init_logging();

    let spec = ciphers::lookup("aes-256-cbc").unwrap();
    let key = [3u8; 32];
    let iv = [4u8; 16];
    let mut ciphertext = encrypt(spec, &key, &iv, b"01234567890123456789").unwrap();
    assert_eq!(ciphertext.len(), 32);
    // The last byte of the first block XORs into the padding byte (0x0c)
    ciphertext[15] ^= 0xff;

    let mut decryptor = CipherContext::decryptor(spec, &key, &iv).unwrap();
    assert_eq!(decryptor.update(&ciphertext).unwrap().len(), 16);
    assert!(matches!(decryptor.finalize(), Err(CryptoError::Cipher(_))));
}

#[test]
fn unknown_cipher() {
    init_logging();

    assert!(matches!(
        ciphers::lookup("des-ede3-cbc"),
        Err(CryptoError::UnknownCipher(_))
    ));
    assert!(!ciphers::is_available("des-ede3-cbc"));
}

#[test]
fn key_and_iv_sizes_are_enforced() {
    init_logging();

    for spec in ciphers::available() {
        let key = vec![0u8; spec.key_size() + 1];
        let iv = vec![0u8; spec.iv_size()];
        assert!(matches!(
            symmetric::encrypt(spec, &key, &iv, b"x"),
            Err(CryptoError::CipherInit(_))
        ));

        let key = vec![0u8; spec.key_size()];
        let iv = vec![0u8; spec.iv_size() + 1];
        assert!(matches!(
            symmetric::decrypt(spec, &key, &iv, b"x"),
            Err(CryptoError::CipherInit(_))
        ));
    }
}
