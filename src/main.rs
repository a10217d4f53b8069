fn main() {
    precarity::run()
}
